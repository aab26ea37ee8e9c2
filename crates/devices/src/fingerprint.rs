//! Device fingerprint - a weak device identity proxy
//!
//! The fingerprint is the set of client-environment attributes the browser
//! probe collects at registration time. Trust comparison uses a fixed
//! subset: the remaining fields are informational (time zone and language
//! change when a driver crosses a border; reported device memory is
//! unreliable and may legitimately be zero).

use serde::{Deserialize, Serialize};

/// Client-environment attributes captured at registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    pub user_agent: String,
    /// e.g. "1920x1080"
    pub screen_resolution: String,
    pub color_depth: u32,
    pub time_zone: String,
    pub language: String,
    pub platform: String,
    pub hardware_concurrency: u32,
    /// Reported in GiB; 0 when the client does not expose it
    pub device_memory: u32,
}

impl DeviceFingerprint {
    /// Name of the first required field that is missing, if any.
    ///
    /// Every field must be populated at registration; `device_memory` is
    /// the one exception since clients commonly report 0 for it.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.user_agent.trim().is_empty() {
            return Some("user_agent");
        }
        if self.screen_resolution.trim().is_empty() {
            return Some("screen_resolution");
        }
        if self.color_depth == 0 {
            return Some("color_depth");
        }
        if self.time_zone.trim().is_empty() {
            return Some("time_zone");
        }
        if self.language.trim().is_empty() {
            return Some("language");
        }
        if self.platform.trim().is_empty() {
            return Some("platform");
        }
        if self.hardware_concurrency == 0 {
            return Some("hardware_concurrency");
        }
        None
    }

    /// Exact match on the trust subset: user agent, resolution, color
    /// depth, platform, and hardware concurrency.
    pub fn matches(&self, other: &DeviceFingerprint) -> bool {
        self.user_agent == other.user_agent
            && self.screen_resolution == other.screen_resolution
            && self.color_depth == other.color_depth
            && self.platform == other.platform
            && self.hardware_concurrency == other.hardware_concurrency
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample() -> DeviceFingerprint {
        DeviceFingerprint {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            screen_resolution: "1920x1080".to_string(),
            color_depth: 24,
            time_zone: "America/Chicago".to_string(),
            language: "en-US".to_string(),
            platform: "Linux x86_64".to_string(),
            hardware_concurrency: 8,
            device_memory: 8,
        }
    }

    #[test]
    fn test_complete_fingerprint() {
        assert_eq!(sample().missing_field(), None);
    }

    #[test]
    fn test_missing_user_agent() {
        let mut fp = sample();
        fp.user_agent = "  ".to_string();
        assert_eq!(fp.missing_field(), Some("user_agent"));
    }

    #[test]
    fn test_zero_concurrency_is_missing() {
        let mut fp = sample();
        fp.hardware_concurrency = 0;
        assert_eq!(fp.missing_field(), Some("hardware_concurrency"));
    }

    #[test]
    fn test_zero_device_memory_allowed() {
        let mut fp = sample();
        fp.device_memory = 0;
        assert_eq!(fp.missing_field(), None);
    }

    #[test]
    fn test_matches_identical() {
        assert!(sample().matches(&sample()));
    }

    #[test]
    fn test_matches_ignores_informational_fields() {
        let mut fp = sample();
        fp.time_zone = "America/Denver".to_string();
        fp.language = "es-MX".to_string();
        fp.device_memory = 4;
        assert!(sample().matches(&fp));
    }

    #[test]
    fn test_platform_change_breaks_match() {
        let mut fp = sample();
        fp.platform = "Win32".to_string();
        assert!(!sample().matches(&fp));
    }

    #[test]
    fn test_resolution_change_breaks_match() {
        let mut fp = sample();
        fp.screen_resolution = "2560x1440".to_string();
        assert!(!sample().matches(&fp));
    }
}
