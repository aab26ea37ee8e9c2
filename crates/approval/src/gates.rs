//! Gate traits - how the workflow reads trust and verification state
//!
//! The workflow never mutates the Device Trust Registry or the
//! Verification Ledger; it consults them through these seams. A gate
//! failure is retryable and must leave the request untouched.

use freightgate_devices::DeviceRegistry;
use freightgate_verification::{SecurityLevel, VerificationLedger};
use thiserror::Error;

/// A gate collaborator failed (timeout, storage error, verifier down).
/// Retryable: the triggering call performs no state mutation.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Gate check failed: {0}")]
    Failed(String),
}

/// Has this approver a currently trusted device?
pub trait TrustGate: Send + Sync {
    fn device_trusted(&self, approver_id: &str) -> Result<bool, GateError>;
}

/// Has this approver passed verification at the given level?
pub trait VerificationGate: Send + Sync {
    fn verified_at(&self, approver_id: &str, level: SecurityLevel) -> Result<bool, GateError>;
}

/// Trust gate backed by the Device Trust Registry
pub struct RegistryTrustGate {
    registry: std::sync::Arc<DeviceRegistry>,
}

impl RegistryTrustGate {
    pub fn new(registry: std::sync::Arc<DeviceRegistry>) -> Self {
        Self { registry }
    }
}

impl TrustGate for RegistryTrustGate {
    fn device_trusted(&self, approver_id: &str) -> Result<bool, GateError> {
        self.registry
            .has_trusted_device(approver_id)
            .map_err(|e| GateError::Failed(e.to_string()))
    }
}

/// Verification gate backed by the Verification Ledger
pub struct LedgerVerificationGate {
    ledger: std::sync::Arc<VerificationLedger>,
}

impl LedgerVerificationGate {
    pub fn new(ledger: std::sync::Arc<VerificationLedger>) -> Self {
        Self { ledger }
    }
}

impl VerificationGate for LedgerVerificationGate {
    fn verified_at(&self, approver_id: &str, level: SecurityLevel) -> Result<bool, GateError> {
        self.ledger
            .has_passed(approver_id, level)
            .map_err(|e| GateError::Failed(e.to_string()))
    }
}

/// Gate that waves everyone through (for testing)
pub struct AllowAll;

impl TrustGate for AllowAll {
    fn device_trusted(&self, _approver_id: &str) -> Result<bool, GateError> {
        Ok(true)
    }
}

impl VerificationGate for AllowAll {
    fn verified_at(&self, _approver_id: &str, _level: SecurityLevel) -> Result<bool, GateError> {
        Ok(true)
    }
}
