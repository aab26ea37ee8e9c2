//! Verification Ledger - records and adjudicates verification attempts

use crate::attempt::{
    AttemptMetadata, SecurityLevel, VerificationAttempt, VerificationStatus, VerificationType,
};
use crate::error::{VerificationError, VerificationResult};
use crate::store::VerificationStore;
use chrono::Duration;

/// Outcome reported by an external verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Passed,
    Failed,
}

/// Configuration for the Verification Ledger
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Time-to-live for a fresh attempt
    pub attempt_ttl: Duration,

    /// Failures allowed before an attempt is blocked
    pub max_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            attempt_ttl: Duration::hours(1),
            max_attempts: 3,
        }
    }
}

/// The Verification Ledger.
///
/// Attempts are created pending and adjudicated by `record_result`.
/// Nothing is ever deleted: expired attempts are marked lazily when
/// touched, or in bulk by `expire_stale` from an external sweep.
pub struct VerificationLedger {
    store: VerificationStore,
    config: LedgerConfig,
}

impl VerificationLedger {
    /// Create a new ledger with the given store and config
    pub fn new(store: VerificationStore, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Create a ledger with an in-memory store (for testing)
    pub fn in_memory() -> VerificationResult<Self> {
        Ok(Self::new(VerificationStore::in_memory()?, LedgerConfig::default()))
    }

    /// Get the configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Open a new pending attempt for a user.
    ///
    /// Fails with `InvalidLevel` unless `level` is 1, 2, or 3.
    pub fn create_attempt(
        &self,
        user_id: &str,
        level: u8,
        vtype: VerificationType,
    ) -> VerificationResult<VerificationAttempt> {
        let level = SecurityLevel::from_u8(level).ok_or(VerificationError::InvalidLevel(level))?;

        let attempt = VerificationAttempt::new(user_id, level, vtype, self.config.attempt_ttl);
        self.store.save(&attempt)?;

        tracing::debug!(
            attempt = %attempt.id,
            user = user_id,
            level = level.as_u8(),
            vtype = vtype.as_str(),
            "Verification attempt opened"
        );

        Ok(attempt)
    }

    /// Get an attempt by ID, lazily marking it expired if its TTL ran out
    /// while it was still undecided (pending or failed-with-retries).
    pub fn get_attempt(&self, id: &str) -> VerificationResult<VerificationAttempt> {
        let mut attempt = self.store.get(id)?;

        if !attempt.status.is_terminal() && attempt.is_expired() {
            attempt.status = VerificationStatus::Expired;
            self.store.save(&attempt)?;
        }

        Ok(attempt)
    }

    /// Record a verifier's outcome for an attempt.
    ///
    /// Fails with `AlreadyTerminal` if the attempt has already passed,
    /// expired, or been blocked, or if its TTL ran out. A failed attempt
    /// with retries left accepts another result - that is the retry. Once
    /// the retry budget is spent the attempt is blocked regardless of the
    /// reported outcome.
    pub fn record_result(
        &self,
        attempt_id: &str,
        outcome: VerificationOutcome,
        metadata: AttemptMetadata,
    ) -> VerificationResult<VerificationAttempt> {
        let mut attempt = self.store.get(attempt_id)?;

        // Lazy expiry: an undecided attempt (pending, or failed with
        // retries left) past its TTL becomes expired here.
        if !attempt.status.is_terminal() && attempt.is_expired() {
            attempt.status = VerificationStatus::Expired;
            self.store.save(&attempt)?;
            return Err(VerificationError::AlreadyTerminal {
                id: attempt.id,
                status: VerificationStatus::Expired,
            });
        }

        match attempt.status {
            VerificationStatus::Pending | VerificationStatus::Failed => {}
            status => {
                return Err(VerificationError::AlreadyTerminal {
                    id: attempt.id,
                    status,
                });
            }
        }

        metadata.validate()?;
        attempt.metadata = metadata;

        // Retry budget spent: blocked, no matter what the verifier said.
        if attempt.attempt_count >= self.config.max_attempts {
            attempt.status = VerificationStatus::Blocked;
            self.store.save(&attempt)?;

            tracing::warn!(
                attempt = %attempt.id,
                user = %attempt.user_id,
                attempts = attempt.attempt_count,
                "Verification attempt blocked after max attempts"
            );

            return Ok(attempt);
        }

        match outcome {
            VerificationOutcome::Passed => {
                attempt.status = VerificationStatus::Passed;
            }
            VerificationOutcome::Failed => {
                attempt.attempt_count += 1;
                attempt.status = VerificationStatus::Failed;
            }
        }

        self.store.save(&attempt)?;
        Ok(attempt)
    }

    /// Pure check: has the attempt's TTL run out?
    pub fn is_expired(attempt: &VerificationAttempt) -> bool {
        attempt.is_expired()
    }

    /// True iff the attempt can still be retried: retry budget left and
    /// not expired.
    pub fn can_retry(&self, attempt: &VerificationAttempt) -> bool {
        attempt.attempt_count < self.config.max_attempts && !attempt.is_expired()
    }

    /// True iff the user holds a passed, unexpired attempt at `min_level`
    /// or above. This is what the approval workflow gates on.
    pub fn has_passed(&self, user_id: &str, min_level: SecurityLevel) -> VerificationResult<bool> {
        let passed = self.store.list_passed_for_user(user_id)?;
        Ok(passed
            .iter()
            .any(|a| a.level >= min_level && !a.is_expired()))
    }

    /// List every attempt for a user, newest first
    pub fn attempts_for_user(&self, user_id: &str) -> VerificationResult<Vec<VerificationAttempt>> {
        Ok(self.store.list_for_user(user_id)?)
    }

    /// Sweep pending attempts past expiry (for an external scheduler).
    /// Returns how many attempts were marked expired.
    pub fn expire_stale(&self) -> VerificationResult<usize> {
        Ok(self.store.expire_stale()?)
    }
}
