//! Approval notifier - fire-and-forget push delivery
//!
//! Delivery is at-least-once and the workflow never depends on it for
//! progress: an approver can always confirm through a direct channel.
//! Failures are logged, not propagated.

use crate::request::{ApprovalRequest, RequestState};
use thiserror::Error;

/// Errors from the notification collaborator
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Push delivery failed: {0}")]
    Delivery(String),

    #[error("Push delivery timed out after {0}ms")]
    Timeout(u64),
}

/// External push-notification sender
pub trait ApprovalNotifier: Send + Sync {
    /// Solicit the pending approvers of a freshly opened request
    fn notify_request(&self, request: &ApprovalRequest) -> Result<(), NotifyError>;

    /// Announce a settled outcome
    fn notify_result(&self, request_id: &str, state: RequestState) -> Result<(), NotifyError>;
}

/// Notifier that drops everything on the floor (for testing and for
/// deployments without push)
pub struct NoopNotifier;

impl ApprovalNotifier for NoopNotifier {
    fn notify_request(&self, _request: &ApprovalRequest) -> Result<(), NotifyError> {
        Ok(())
    }

    fn notify_result(&self, _request_id: &str, _state: RequestState) -> Result<(), NotifyError> {
        Ok(())
    }
}
