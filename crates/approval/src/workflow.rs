//! Approval workflow logic

use crate::gates::{GateError, TrustGate, VerificationGate};
use crate::history::{Actor, ChangeType, FieldDelta, StepChange, StepHistoryEntry};
use crate::locks::RequestLocks;
use crate::notify::ApprovalNotifier;
use crate::request::{ApprovalPayload, ApprovalRequest, ApproverStatus, Decision, RequestState};
use crate::store::{ApprovalStore, StoreError};
use chrono::Utc;
use freightgate_core::Amount;
use freightgate_verification::SecurityLevel;
use rust_decimal::Decimal;
use thiserror::Error;

/// Step indexes in a request's history
const STEP_PROPOSAL: u32 = 0;
const STEP_CONFIRMATIONS: u32 = 1;

/// Configuration for the approval workflow
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    /// Rate changes at or above this amount need elevated verification
    pub rate_elevation_threshold: Amount,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            // 10,000 in the quote currency
            rate_elevation_threshold: Amount::new_unchecked(Decimal::new(10_000, 0)),
        }
    }
}

impl ApprovalPolicy {
    /// Verification level an approver must hold to decide on this payload
    pub fn required_level(&self, payload: &ApprovalPayload) -> SecurityLevel {
        match payload {
            ApprovalPayload::Rate { amount, .. } if *amount >= self.rate_elevation_threshold => {
                SecurityLevel::L2
            }
            ApprovalPayload::Rate { .. } => SecurityLevel::L1,
            ApprovalPayload::BillOfLading { .. } => SecurityLevel::L2,
            ApprovalPayload::Other { .. } => SecurityLevel::L1,
        }
    }
}

/// Errors from the approval workflow
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Required approver set is empty")]
    EmptyApproverSet,

    #[error("Duplicate approver in required set: {0}")]
    DuplicateApprover(String),

    #[error("Unknown request: {0}")]
    UnknownRequest(String),

    #[error("Request {0} is already settled")]
    RequestAlreadySettled(String),

    #[error("Approver {approver} already decided on request {request}")]
    ApproverAlreadyDecided { request: String, approver: String },

    #[error("Approver {approver} is not required on request {request}")]
    UnauthorizedApprover { request: String, approver: String },

    #[error("Approver {0} has no trusted device")]
    TrustRequired(String),

    #[error("Approver {approver} lacks a passed level-{level} verification")]
    VerificationRequired { approver: String, level: u8 },

    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    #[error("Request lock poisoned")]
    LockPoisoned,
}

/// Multi-party approval workflow.
///
/// Owns the requests and their step history; reads device trust and
/// verification state through the gate traits. All mutation for one
/// request happens under that request's lock, and every call commits
/// atomically - a gate failure or validation error leaves the request in
/// its prior state.
pub struct ApprovalWorkflow {
    store: ApprovalStore,
    policy: ApprovalPolicy,
    trust: Box<dyn TrustGate>,
    verification: Box<dyn VerificationGate>,
    notifier: Box<dyn ApprovalNotifier>,
    locks: RequestLocks,
}

impl ApprovalWorkflow {
    /// Create a new workflow
    pub fn new(
        store: ApprovalStore,
        policy: ApprovalPolicy,
        trust: Box<dyn TrustGate>,
        verification: Box<dyn VerificationGate>,
        notifier: Box<dyn ApprovalNotifier>,
    ) -> Self {
        Self {
            store,
            policy,
            trust,
            verification,
            notifier,
            locks: RequestLocks::new(),
        }
    }

    /// Get the policy
    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /// Open a new approval request.
    ///
    /// Every approver starts pending; the notifier is asked to solicit
    /// them, and a Creation entry lands in the history.
    pub fn open_request(
        &self,
        payload: ApprovalPayload,
        required_approvers: Vec<String>,
        opened_by: Actor,
    ) -> Result<ApprovalRequest, ApprovalError> {
        if required_approvers.is_empty() {
            return Err(ApprovalError::EmptyApproverSet);
        }
        for (i, id) in required_approvers.iter().enumerate() {
            if required_approvers[..i].contains(id) {
                return Err(ApprovalError::DuplicateApprover(id.clone()));
            }
        }

        let request = ApprovalRequest::new(payload, required_approvers);
        let change = StepChange::new(
            request.payload.describe(),
            opened_by,
            ChangeType::Creation,
            None,
        );
        self.store
            .save_with_changes(&request, STEP_PROPOSAL, request.payload.label(), &[&change])?;

        tracing::debug!(
            request = %request.id,
            approvers = request.approvers.len(),
            payload = request.payload.label(),
            "Approval request opened"
        );

        if let Err(e) = self.notifier.notify_request(&request) {
            tracing::warn!(request = %request.id, error = %e, "Approval solicitation failed");
        }

        Ok(request)
    }

    /// Get a request by ID
    pub fn get_request(&self, id: &str) -> Result<ApprovalRequest, ApprovalError> {
        self.store.get(id).map_err(|e| match e {
            StoreError::NotFound(id) => ApprovalError::UnknownRequest(id),
            other => ApprovalError::Store(other),
        })
    }

    /// List unsettled requests
    pub fn list_open(&self) -> Result<Vec<ApprovalRequest>, ApprovalError> {
        Ok(self.store.list_open()?)
    }

    /// A request's audit trail
    pub fn history(&self, request_id: &str) -> Result<Vec<StepHistoryEntry>, ApprovalError> {
        Ok(self.store.history(request_id)?)
    }

    /// Record one approver's decision.
    ///
    /// Serialized per request id. Resubmitting the same decision is an
    /// idempotent no-op; everything else on a settled request fails with
    /// `RequestAlreadySettled`. Trust and verification gates run before
    /// any mutation, so a gate failure is safe to retry.
    pub fn submit_approval(
        &self,
        request_id: &str,
        approver_id: &str,
        decision: Decision,
        actor: Actor,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let lock = self
            .locks
            .for_request(request_id)
            .ok_or(ApprovalError::LockPoisoned)?;
        let _guard = lock.lock().map_err(|_| ApprovalError::LockPoisoned)?;

        let mut request = self.get_request(request_id)?;

        // Idempotent replay: same approver, same decision, nothing to do.
        if let Some(slot) = request.slot(approver_id) {
            if slot.status == decision.as_status() {
                return Ok(request);
            }
        }

        if request.is_settled() {
            return Err(ApprovalError::RequestAlreadySettled(request.id));
        }

        let slot_status = match request.slot(approver_id) {
            Some(slot) => slot.status,
            None => {
                return Err(ApprovalError::UnauthorizedApprover {
                    request: request.id,
                    approver: approver_id.to_string(),
                })
            }
        };
        if slot_status != ApproverStatus::Pending {
            return Err(ApprovalError::ApproverAlreadyDecided {
                request: request.id,
                approver: approver_id.to_string(),
            });
        }

        // Gates: consult trust and verification before touching anything.
        if !self.trust.device_trusted(approver_id)? {
            return Err(ApprovalError::TrustRequired(approver_id.to_string()));
        }
        let level = self.policy.required_level(&request.payload);
        if !self.verification.verified_at(approver_id, level)? {
            return Err(ApprovalError::VerificationRequired {
                approver: approver_id.to_string(),
                level: level.as_u8(),
            });
        }

        // Apply the decision in memory.
        let now = Utc::now();
        if let Some(slot) = request.slot_mut(approver_id) {
            slot.status = decision.as_status();
            slot.decided_at = Some(now);
        }

        let (change_type, verb) = match decision {
            Decision::Confirmed => (ChangeType::Acceptance, "confirmed"),
            Decision::Denied => (ChangeType::Denial, "denied"),
        };
        let decided = StepChange::new(
            format!("{} {} the {}", actor.name, verb, request.payload.label()),
            actor.clone(),
            change_type,
            Some(FieldDelta {
                field: format!("approvers.{}", approver_id),
                old_value: Some(ApproverStatus::Pending.as_str().to_string()),
                new_value: Some(decision.as_status().as_str().to_string()),
            }),
        );

        // Recompute and settle if terminal.
        let state = request.derived_state();
        if state == RequestState::Denied {
            // Short-circuit: nobody else is solicited further.
            for slot in &mut request.approvers {
                if slot.status == ApproverStatus::Pending {
                    slot.status = ApproverStatus::Moot;
                }
            }
        }

        let settle = if state != RequestState::Open {
            request.settled_at = Some(now);
            Some(StepChange::new(
                format!("Request settled: {}", state.as_str()),
                actor,
                ChangeType::Modification,
                Some(FieldDelta {
                    field: "state".to_string(),
                    old_value: Some(RequestState::Open.as_str().to_string()),
                    new_value: Some(state.as_str().to_string()),
                }),
            ))
        } else {
            None
        };

        // One transaction: the slot update, the decision entry, and the
        // settlement entry land together or not at all.
        let mut changes = vec![&decided];
        changes.extend(settle.as_ref());
        self.store
            .save_with_changes(&request, STEP_CONFIRMATIONS, "confirmations", &changes)?;

        if state != RequestState::Open {
            tracing::debug!(request = %request.id, state = state.as_str(), "Approval request settled");

            if let Err(e) = self.notifier.notify_result(&request.id, state) {
                tracing::warn!(request = %request.id, error = %e, "Result notification failed");
            }
        }

        Ok(request)
    }
}
