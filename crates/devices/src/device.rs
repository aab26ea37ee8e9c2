//! Registered device record

use crate::fingerprint::DeviceFingerprint;
use chrono::{DateTime, Utc};
use freightgate_core::PartyRole;
use serde::{Deserialize, Serialize};

/// A device bound to a user and role.
///
/// # Lifecycle
/// Created on first successful registration. `last_used` is refreshed on
/// every successful trust check. Deactivated (never deleted) on explicit
/// revoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredDevice {
    pub id: String,
    pub user_id: String,
    pub role: PartyRole,
    pub fingerprint: DeviceFingerprint,
    pub push_token: String,
    pub last_used: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl RegisteredDevice {
    /// Create a fresh, active device record
    pub fn new(
        user_id: impl Into<String>,
        role: PartyRole,
        fingerprint: DeviceFingerprint,
        push_token: impl Into<String>,
    ) -> Self {
        let id = format!("DEV-{}", &uuid::Uuid::new_v4().to_string()[..8].to_uppercase());
        let now = Utc::now();

        Self {
            id,
            user_id: user_id.into(),
            role,
            fingerprint,
            push_token: push_token.into(),
            last_used: now,
            active: true,
            created_at: now,
        }
    }
}
