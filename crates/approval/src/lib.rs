//! FreightGate Approval - the multi-party approval workflow
//!
//! Drives a proposed change (rate, bill of lading) through per-party
//! confirmation. A request stays open while any approver is pending,
//! settles approved once every approver confirms, and settles denied the
//! moment any single approver denies - remaining approvers are mooted and
//! solicited no further. Every transition lands in an append-only step
//! history.
//!
//! The workflow reads the Device Trust Registry and the Verification
//! Ledger through gate traits; it never mutates either.

pub mod gates;
pub mod history;
pub mod locks;
pub mod notify;
pub mod request;
pub mod store;
pub mod workflow;

pub use gates::{
    AllowAll, GateError, LedgerVerificationGate, RegistryTrustGate, TrustGate, VerificationGate,
};
pub use history::{Actor, ChangeType, FieldDelta, StepChange, StepHistoryEntry};
pub use notify::{ApprovalNotifier, NoopNotifier, NotifyError};
pub use request::{ApprovalPayload, ApprovalRequest, ApproverStatus, Decision, RequestState};
pub use store::{ApprovalStore, StoreError};
pub use workflow::{ApprovalError, ApprovalPolicy, ApprovalWorkflow};
