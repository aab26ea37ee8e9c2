//! Device Trust Registry errors

use crate::registry::PushConsentError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors from the Device Trust Registry
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Incomplete fingerprint: missing {0}")]
    IncompleteFingerprint(&'static str),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Push notification permission denied")]
    PushPermissionDenied,

    #[error("Push consent collaborator failed: {0}")]
    PushConsentUnavailable(String),
}

impl From<PushConsentError> for DeviceError {
    fn from(err: PushConsentError) -> Self {
        match err {
            PushConsentError::Denied => DeviceError::PushPermissionDenied,
            PushConsentError::Unavailable(reason) => DeviceError::PushConsentUnavailable(reason),
        }
    }
}

/// Result type for registry operations
pub type DeviceResult<T> = Result<T, DeviceError>;
