//! FreightGate Verification - the Verification Ledger
//!
//! Records identity/device/location verification attempts per user and
//! per security level, with expiry and retry limiting. Attempts are never
//! deleted: expiry is enforced lazily when a caller touches an attempt,
//! and `expire_stale` is exposed for a background sweep.

pub mod attempt;
pub mod error;
pub mod ledger;
pub mod store;

pub use attempt::{
    AttemptMetadata, ChallengeType, GpsFix, MetadataError, SecurityLevel, VerificationAttempt,
    VerificationStatus, VerificationType,
};
pub use error::{VerificationError, VerificationResult};
pub use ledger::{LedgerConfig, VerificationLedger, VerificationOutcome};
pub use store::{StoreError, VerificationStore};
