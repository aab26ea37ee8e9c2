//! Verification attempt data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from metadata validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    #[error("Confidence score out of range [0, 1]: {0}")]
    ConfidenceOutOfRange(f64),

    #[error("Evidence URL must be https: {0}")]
    InsecureUrl(String),

    #[error("Invalid GPS fix: {0}")]
    InvalidGpsFix(String),
}

/// Security level a verification attempt counts toward.
///
/// L1 covers routine confirmations, L2 gates rate changes above the
/// elevation threshold, L3 is reserved for high-risk actions (voice print,
/// liveness challenge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    L1 = 1,
    L2 = 2,
    L3 = 3,
}

impl SecurityLevel {
    /// Parse a numeric level; only 1..=3 are valid.
    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(SecurityLevel::L1),
            2 => Some(SecurityLevel::L2),
            3 => Some(SecurityLevel::L3),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// What kind of check this attempt records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationType {
    /// Mailbox ownership
    Email,
    /// SMS or call-back
    Phone,
    /// Device registration / anti-spoofing
    Device,
    /// Location verification
    Gps,
    /// Selfie match with ID
    Face,
    /// Anti-spoofing challenge
    Liveness,
    /// Voice print, L3 only
    Voice,
    /// TOTP / push confirmation
    TwoFactor,
    /// Document OCR / validation
    Document,
}

impl VerificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationType::Email => "email",
            VerificationType::Phone => "phone",
            VerificationType::Device => "device",
            VerificationType::Gps => "gps",
            VerificationType::Face => "face",
            VerificationType::Liveness => "liveness",
            VerificationType::Voice => "voice",
            VerificationType::TwoFactor => "2fa",
            VerificationType::Document => "kyc_document",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "email" => Some(VerificationType::Email),
            "phone" => Some(VerificationType::Phone),
            "device" => Some(VerificationType::Device),
            "gps" => Some(VerificationType::Gps),
            "face" => Some(VerificationType::Face),
            "liveness" => Some(VerificationType::Liveness),
            "voice" => Some(VerificationType::Voice),
            "2fa" => Some(VerificationType::TwoFactor),
            "kyc_document" => Some(VerificationType::Document),
            _ => None,
        }
    }
}

/// Status of a verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Awaiting a result
    Pending,
    /// Verification successful
    Passed,
    /// Verification failed; replayable while retries remain
    Failed,
    /// Timed out before a result arrived
    Expired,
    /// Retry budget exhausted
    Blocked,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Passed => "passed",
            VerificationStatus::Failed => "failed",
            VerificationStatus::Expired => "expired",
            VerificationStatus::Blocked => "blocked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(VerificationStatus::Pending),
            "passed" => Some(VerificationStatus::Passed),
            "failed" => Some(VerificationStatus::Failed),
            "expired" => Some(VerificationStatus::Expired),
            "blocked" => Some(VerificationStatus::Blocked),
            _ => None,
        }
    }

    /// Passed, expired and blocked attempts accept no further results.
    /// Failed is deliberately not here: a failed attempt with retries
    /// left may receive another result.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VerificationStatus::Passed | VerificationStatus::Expired | VerificationStatus::Blocked
        )
    }
}

/// Challenge issued during a liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeType {
    Smile,
    Blink,
    TurnHead,
    SpeakPhrase,
}

/// A GPS fix captured during a location check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: f64,
    pub lng: f64,
    /// Reported accuracy in meters
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl GpsFix {
    fn validate(&self) -> Result<(), MetadataError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(MetadataError::InvalidGpsFix(format!("lat {}", self.lat)));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(MetadataError::InvalidGpsFix(format!("lng {}", self.lng)));
        }
        if self.accuracy < 0.0 {
            return Err(MetadataError::InvalidGpsFix(format!(
                "accuracy {}",
                self.accuracy
            )));
        }
        Ok(())
    }
}

/// Supporting evidence attached to a verification result.
///
/// Everything is optional; verifiers fill in what they have. Evidence
/// URLs must be https.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptMetadata {
    // Outcome detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    // Challenge detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_type: Option<ChallengeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_response: Option<String>,

    // Evidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selfie_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_print_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,

    // Location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsFix>,

    // Device descriptors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,

    // Network descriptors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_fingerprint: Option<String>,
}

impl AttemptMetadata {
    /// Validate ranges and evidence URL schemes
    pub fn validate(&self) -> Result<(), MetadataError> {
        if let Some(score) = self.confidence_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(MetadataError::ConfidenceOutOfRange(score));
            }
        }
        for url in [&self.selfie_url, &self.voice_print_url, &self.document_url]
            .into_iter()
            .flatten()
        {
            if !url.starts_with("https://") {
                return Err(MetadataError::InsecureUrl(url.clone()));
            }
        }
        if let Some(ref gps) = self.gps {
            gps.validate()?;
        }
        Ok(())
    }
}

/// A single verification attempt in the ledger.
///
/// # Invariants
/// - `expires_at > attempted_at`
/// - `attempt_count >= 1`
/// - status transitions only pending -> {passed, failed, expired, blocked};
///   once passed, expired, or blocked, the attempt is inert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationAttempt {
    pub id: String,
    pub user_id: String,
    pub level: SecurityLevel,
    pub vtype: VerificationType,
    pub status: VerificationStatus,
    pub attempted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempt_count: u32,
    pub metadata: AttemptMetadata,
}

impl VerificationAttempt {
    /// Create a fresh pending attempt with the given time-to-live
    pub fn new(
        user_id: impl Into<String>,
        level: SecurityLevel,
        vtype: VerificationType,
        ttl: chrono::Duration,
    ) -> Self {
        let id = format!("VRF-{}", &uuid::Uuid::new_v4().to_string()[..8].to_uppercase());
        let now = Utc::now();

        Self {
            id,
            user_id: user_id.into(),
            level,
            vtype,
            status: VerificationStatus::Pending,
            attempted_at: now,
            expires_at: now + ttl,
            attempt_count: 1,
            metadata: AttemptMetadata::default(),
        }
    }

    /// Check if the attempt has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check against an explicit clock (for sweeps and tests)
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_attempt_defaults() {
        let attempt =
            VerificationAttempt::new("USER-001", SecurityLevel::L2, VerificationType::Face, Duration::hours(1));

        assert!(attempt.id.starts_with("VRF-"));
        assert_eq!(attempt.status, VerificationStatus::Pending);
        assert_eq!(attempt.attempt_count, 1);
        assert!(attempt.expires_at > attempt.attempted_at);
        assert!(!attempt.is_expired());
    }

    #[test]
    fn test_expiry_with_explicit_clock() {
        let attempt =
            VerificationAttempt::new("USER-001", SecurityLevel::L1, VerificationType::Email, Duration::hours(1));

        let later = Utc::now() + Duration::hours(2);
        assert!(attempt.is_expired_at(later));
        assert!(!attempt.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_level_from_u8() {
        assert_eq!(SecurityLevel::from_u8(1), Some(SecurityLevel::L1));
        assert_eq!(SecurityLevel::from_u8(3), Some(SecurityLevel::L3));
        assert_eq!(SecurityLevel::from_u8(0), None);
        assert_eq!(SecurityLevel::from_u8(4), None);
    }

    #[test]
    fn test_level_ordering() {
        assert!(SecurityLevel::L1 < SecurityLevel::L2);
        assert!(SecurityLevel::L2 < SecurityLevel::L3);
    }

    #[test]
    fn test_type_string_roundtrip() {
        for vtype in [
            VerificationType::Email,
            VerificationType::Phone,
            VerificationType::Device,
            VerificationType::Gps,
            VerificationType::Face,
            VerificationType::Liveness,
            VerificationType::Voice,
            VerificationType::TwoFactor,
            VerificationType::Document,
        ] {
            assert_eq!(VerificationType::from_str(vtype.as_str()), Some(vtype));
        }
    }

    #[test]
    fn test_status_terminality() {
        assert!(VerificationStatus::Passed.is_terminal());
        assert!(VerificationStatus::Expired.is_terminal());
        assert!(VerificationStatus::Blocked.is_terminal());
        assert!(!VerificationStatus::Pending.is_terminal());
        assert!(!VerificationStatus::Failed.is_terminal());
    }

    #[test]
    fn test_metadata_confidence_range() {
        let metadata = AttemptMetadata {
            confidence_score: Some(1.2),
            ..Default::default()
        };
        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::ConfidenceOutOfRange(_))
        ));
    }

    #[test]
    fn test_metadata_rejects_http_evidence() {
        let metadata = AttemptMetadata {
            selfie_url: Some("http://example.com/selfie.jpg".to_string()),
            ..Default::default()
        };
        assert!(matches!(metadata.validate(), Err(MetadataError::InsecureUrl(_))));
    }

    #[test]
    fn test_metadata_gps_bounds() {
        let metadata = AttemptMetadata {
            gps: Some(GpsFix {
                lat: 95.0,
                lng: 0.0,
                accuracy: 5.0,
                timestamp: Utc::now(),
            }),
            ..Default::default()
        };
        assert!(matches!(metadata.validate(), Err(MetadataError::InvalidGpsFix(_))));
    }
}
