//! Verification Ledger errors

use crate::attempt::{MetadataError, VerificationStatus};
use crate::store::StoreError;
use thiserror::Error;

/// Errors from the Verification Ledger
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid security level: {0} (must be 1-3)")]
    InvalidLevel(u8),

    #[error("Attempt {id} is already terminal ({status:?})")]
    AlreadyTerminal {
        id: String,
        status: VerificationStatus,
    },

    #[error("Invalid metadata: {0}")]
    Metadata(#[from] MetadataError),
}

/// Result type for ledger operations
pub type VerificationResult<T> = Result<T, VerificationError>;
