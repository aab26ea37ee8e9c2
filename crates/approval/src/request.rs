//! Approval request data structures

use chrono::{DateTime, Utc};
use freightgate_core::{Amount, Currency};
use serde::{Deserialize, Serialize};

/// What is being approved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApprovalPayload {
    /// A proposed freight rate
    Rate { amount: Amount, currency: Currency },
    /// A bill of lading tied to a shipment
    BillOfLading {
        document_id: String,
        shipment_id: String,
    },
    /// Anything else a broker wants countersigned
    Other { description: String },
}

impl ApprovalPayload {
    /// Short label used in step history
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalPayload::Rate { .. } => "rate",
            ApprovalPayload::BillOfLading { .. } => "bill_of_lading",
            ApprovalPayload::Other { .. } => "other",
        }
    }

    /// One-line description for audit entries
    pub fn describe(&self) -> String {
        match self {
            ApprovalPayload::Rate { amount, currency } => {
                format!("Rate proposed: {} {}", amount, currency)
            }
            ApprovalPayload::BillOfLading {
                document_id,
                shipment_id,
            } => format!("Bill of lading {} for shipment {}", document_id, shipment_id),
            ApprovalPayload::Other { description } => description.clone(),
        }
    }
}

/// Per-approver confirmation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproverStatus {
    /// Awaiting this approver's decision
    Pending,
    Confirmed,
    Denied,
    /// Short-circuited by another approver's denial; no further action
    /// is possible on this slot
    Moot,
}

impl ApproverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApproverStatus::Pending => "pending",
            ApproverStatus::Confirmed => "confirmed",
            ApproverStatus::Denied => "denied",
            ApproverStatus::Moot => "moot",
        }
    }
}

/// The decision an approver submits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Confirmed,
    Denied,
}

impl Decision {
    /// The approver status this decision lands the slot in
    pub fn as_status(&self) -> ApproverStatus {
        match self {
            Decision::Confirmed => ApproverStatus::Confirmed,
            Decision::Denied => ApproverStatus::Denied,
        }
    }
}

/// Derived request-level state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// At least one approver is still pending and nobody has denied
    Open,
    /// Every required approver confirmed
    Approved,
    /// At least one approver denied
    Denied,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Open => "open",
            RequestState::Approved => "approved",
            RequestState::Denied => "denied",
        }
    }
}

/// One required approver and where they stand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproverSlot {
    pub approver_id: String,
    pub status: ApproverStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl ApproverSlot {
    fn pending(approver_id: impl Into<String>) -> Self {
        Self {
            approver_id: approver_id.into(),
            status: ApproverStatus::Pending,
            decided_at: None,
        }
    }
}

/// A multi-party approval request.
///
/// # Invariants
/// - `approvers` is non-empty and approver ids are unique
/// - the request is settled exactly when `derived_state() != Open`, and
///   `settled_at` is set at that moment and never cleared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub payload: ApprovalPayload,
    pub approvers: Vec<ApproverSlot>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    /// Create a new open request with every approver pending
    pub fn new(payload: ApprovalPayload, required_approvers: Vec<String>) -> Self {
        let id = format!("REQ-{}", &uuid::Uuid::new_v4().to_string()[..8].to_uppercase());

        Self {
            id,
            payload,
            approvers: required_approvers
                .into_iter()
                .map(ApproverSlot::pending)
                .collect(),
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Find an approver's slot
    pub fn slot(&self, approver_id: &str) -> Option<&ApproverSlot> {
        self.approvers.iter().find(|s| s.approver_id == approver_id)
    }

    pub(crate) fn slot_mut(&mut self, approver_id: &str) -> Option<&mut ApproverSlot> {
        self.approvers
            .iter_mut()
            .find(|s| s.approver_id == approver_id)
    }

    /// Recompute the request-level state from the approver slots.
    ///
    /// First denial wins regardless of arrival order; approval requires
    /// every slot confirmed.
    pub fn derived_state(&self) -> RequestState {
        if self
            .approvers
            .iter()
            .any(|s| s.status == ApproverStatus::Denied)
        {
            return RequestState::Denied;
        }
        if self
            .approvers
            .iter()
            .all(|s| s.status == ApproverStatus::Confirmed)
        {
            return RequestState::Approved;
        }
        RequestState::Open
    }

    /// A settled request accepts no further decisions
    pub fn is_settled(&self) -> bool {
        self.derived_state() != RequestState::Open
    }

    /// Approver ids still pending
    pub fn pending_approvers(&self) -> Vec<&str> {
        self.approvers
            .iter()
            .filter(|s| s.status == ApproverStatus::Pending)
            .map(|s| s.approver_id.as_str())
            .collect()
    }
}
