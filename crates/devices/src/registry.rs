//! Device Trust Registry - registration and trust adjudication

use crate::device::RegisteredDevice;
use crate::error::{DeviceError, DeviceResult};
use crate::fingerprint::DeviceFingerprint;
use crate::store::DeviceStore;
use chrono::{Duration, Utc};
use freightgate_core::PartyRole;
use thiserror::Error;

/// Errors from the push-consent collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PushConsentError {
    #[error("User denied push notification permission")]
    Denied,

    #[error("Push service unavailable: {0}")]
    Unavailable(String),
}

/// External collaborator that obtains push-notification consent and a
/// delivery token for a device. Must complete within a bounded time;
/// a hung or failed collaborator surfaces as `Unavailable`.
pub trait PushConsent: Send + Sync {
    fn request_token(&self, user_id: &str, role: PartyRole) -> Result<String, PushConsentError>;
}

/// Push consent that always hands out the same token (for testing)
pub struct StaticToken(pub String);

impl PushConsent for StaticToken {
    fn request_token(&self, _user_id: &str, _role: PartyRole) -> Result<String, PushConsentError> {
        Ok(self.0.clone())
    }
}

/// Why a trust check came back negative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustReason {
    FingerprintMismatch,
}

/// Outcome of a trust check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustResult {
    pub trusted: bool,
    pub reason: Option<TrustReason>,
}

impl TrustResult {
    fn trusted() -> Self {
        Self {
            trusted: true,
            reason: None,
        }
    }

    fn mismatch() -> Self {
        Self {
            trusted: false,
            reason: Some(TrustReason::FingerprintMismatch),
        }
    }
}

/// Configuration for the Device Trust Registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// How long a successful trust check vouches for the device
    pub trust_window: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            trust_window: Duration::minutes(15),
        }
    }
}

/// The Device Trust Registry.
///
/// Registration is all-or-nothing: the push-consent collaborator must
/// hand out a token before any record is written. A fingerprint mismatch
/// on a trust check flags the device but does not deactivate it; revoking
/// is an explicit, manual act.
pub struct DeviceRegistry {
    store: DeviceStore,
    config: RegistryConfig,
    push: Box<dyn PushConsent>,
}

impl DeviceRegistry {
    /// Create a new registry
    pub fn new(store: DeviceStore, config: RegistryConfig, push: Box<dyn PushConsent>) -> Self {
        Self {
            store,
            config,
            push,
        }
    }

    /// Create a registry with an in-memory store and a static push token
    /// (for testing)
    pub fn in_memory() -> DeviceResult<Self> {
        Ok(Self::new(
            DeviceStore::in_memory()?,
            RegistryConfig::default(),
            Box::new(StaticToken("test-push-token".to_string())),
        ))
    }

    /// Get the configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a device for a user.
    ///
    /// Fails with `IncompleteFingerprint` if a required fingerprint field
    /// is missing, and with `PushPermissionDenied` if the collaborator
    /// cannot obtain consent - in which case no record is created.
    pub fn register_device(
        &self,
        user_id: &str,
        role: PartyRole,
        fingerprint: DeviceFingerprint,
    ) -> DeviceResult<RegisteredDevice> {
        if let Some(field) = fingerprint.missing_field() {
            return Err(DeviceError::IncompleteFingerprint(field));
        }

        // Consent first: no token, no record.
        let push_token = self.push.request_token(user_id, role)?;

        let device = RegisteredDevice::new(user_id, role, fingerprint, push_token);
        self.store.save(&device)?;

        tracing::debug!(device = %device.id, user = user_id, role = %role, "Device registered");

        Ok(device)
    }

    /// Adjudicate trust for a device against its current fingerprint.
    ///
    /// Fails with `DeviceNotFound` if the id is unknown or the device is
    /// inactive. A mismatch on the trust subset reports untrusted without
    /// deactivating the device; a match refreshes `last_used`.
    pub fn check_trust(
        &self,
        device_id: &str,
        current: &DeviceFingerprint,
    ) -> DeviceResult<TrustResult> {
        let mut device = self.store.get(device_id).map_err(|e| match e {
            crate::store::StoreError::NotFound(id) => DeviceError::DeviceNotFound(id),
            other => DeviceError::Store(other),
        })?;

        if !device.active {
            return Err(DeviceError::DeviceNotFound(device_id.to_string()));
        }

        if !device.fingerprint.matches(current) {
            tracing::warn!(
                device = device_id,
                user = %device.user_id,
                "Fingerprint mismatch on trust check"
            );
            return Ok(TrustResult::mismatch());
        }

        device.last_used = Utc::now();
        self.store.save(&device)?;

        Ok(TrustResult::trusted())
    }

    /// Deactivate a device. Idempotent: deactivating an already-inactive
    /// device is a no-op; only a never-registered id is an error.
    pub fn deactivate(&self, device_id: &str) -> DeviceResult<()> {
        let mut device = self.store.get(device_id).map_err(|e| match e {
            crate::store::StoreError::NotFound(id) => DeviceError::DeviceNotFound(id),
            other => DeviceError::Store(other),
        })?;

        if !device.active {
            return Ok(());
        }

        device.active = false;
        self.store.save(&device)?;

        tracing::debug!(device = device_id, user = %device.user_id, "Device deactivated");

        Ok(())
    }

    /// Get a device by id (active or not)
    pub fn get_device(&self, device_id: &str) -> DeviceResult<RegisteredDevice> {
        self.store.get(device_id).map_err(|e| match e {
            crate::store::StoreError::NotFound(id) => DeviceError::DeviceNotFound(id),
            other => DeviceError::Store(other),
        })
    }

    /// True iff the user has an active device whose last successful trust
    /// check is within the trust window. This is what the approval
    /// workflow gates on.
    pub fn has_trusted_device(&self, user_id: &str) -> DeviceResult<bool> {
        let cutoff = Utc::now() - self.config.trust_window;
        let devices = self.store.list_for_user(user_id)?;
        Ok(devices.iter().any(|d| d.active && d.last_used >= cutoff))
    }
}
