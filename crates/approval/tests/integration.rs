//! End-to-end tests wiring the approval workflow to a real Device Trust
//! Registry and Verification Ledger.

use std::sync::Arc;

use freightgate_approval::{
    Actor, ApprovalError, ApprovalPayload, ApprovalPolicy, ApprovalStore, ApprovalWorkflow,
    ApproverStatus, ChangeType, Decision, LedgerVerificationGate, NoopNotifier, RegistryTrustGate,
    RequestState,
};
use freightgate_core::{Amount, Currency, PartyRole};
use freightgate_devices::{DeviceFingerprint, DeviceRegistry, RegisteredDevice};
use freightgate_verification::{
    AttemptMetadata, VerificationLedger, VerificationOutcome, VerificationType,
};
use rust_decimal_macros::dec;

fn fingerprint() -> DeviceFingerprint {
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

struct Harness {
    registry: Arc<DeviceRegistry>,
    ledger: Arc<VerificationLedger>,
    workflow: ApprovalWorkflow,
}

fn harness() -> Harness {
    let registry = Arc::new(DeviceRegistry::in_memory().unwrap());
    let ledger = Arc::new(VerificationLedger::in_memory().unwrap());

    let workflow = ApprovalWorkflow::new(
        ApprovalStore::in_memory().unwrap(),
        ApprovalPolicy::default(),
        Box::new(RegistryTrustGate::new(registry.clone())),
        Box::new(LedgerVerificationGate::new(ledger.clone())),
        Box::new(NoopNotifier),
    );

    Harness {
        registry,
        ledger,
        workflow,
    }
}

impl Harness {
    /// Register a device and pass a verification so the user clears both
    /// gates at the given level.
    fn clear_gates(&self, user_id: &str, role: PartyRole, level: u8) -> RegisteredDevice {
        let device = self
            .registry
            .register_device(user_id, role, fingerprint())
            .unwrap();

        let attempt = self
            .ledger
            .create_attempt(user_id, level, VerificationType::Device)
            .unwrap();
        self.ledger
            .record_result(
                &attempt.id,
                VerificationOutcome::Passed,
                AttemptMetadata::default(),
            )
            .unwrap();

        device
    }
}

fn small_rate() -> ApprovalPayload {
    ApprovalPayload::Rate {
        amount: Amount::new(dec!(2500)).unwrap(),
        currency: Currency::Usd,
    }
}

fn elevated_rate() -> ApprovalPayload {
    ApprovalPayload::Rate {
        amount: Amount::new(dec!(18000)).unwrap(),
        currency: Currency::Usd,
    }
}

fn parties() -> [(&'static str, PartyRole); 3] {
    [
        ("shipper-1", PartyRole::Shipper),
        ("broker-1", PartyRole::Broker),
        ("carrier-1", PartyRole::Carrier),
    ]
}

fn approver_ids() -> Vec<String> {
    parties().iter().map(|(id, _)| id.to_string()).collect()
}

#[test]
fn test_three_party_rate_approval() {
    let h = harness();
    for (id, role) in parties() {
        h.clear_gates(id, role, 1);
    }

    let request = h
        .workflow
        .open_request(small_rate(), approver_ids(), Actor::new("broker-1", PartyRole::Broker))
        .unwrap();

    for (id, role) in parties() {
        h.workflow
            .submit_approval(&request.id, id, Decision::Confirmed, Actor::new(id, role))
            .unwrap();
    }

    let settled = h.workflow.get_request(&request.id).unwrap();
    assert_eq!(settled.derived_state(), RequestState::Approved);
    assert!(settled.settled_at.is_some());
    assert!(h.workflow.list_open().unwrap().is_empty());

    // One creation entry, then the confirmations in submission order.
    let history = h.workflow.history(&request.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].changes[0].change_type, ChangeType::Creation);

    let acceptance_actors: Vec<&str> = history[1]
        .changes
        .iter()
        .filter(|c| c.change_type == ChangeType::Acceptance)
        .map(|c| c.actor.name.as_str())
        .collect();
    assert_eq!(acceptance_actors, vec!["shipper-1", "broker-1", "carrier-1"]);
}

#[test]
fn test_denial_short_circuits_late_submitters() {
    let h = harness();
    for (id, role) in parties() {
        h.clear_gates(id, role, 1);
    }

    let request = h
        .workflow
        .open_request(small_rate(), approver_ids(), Actor::new("broker-1", PartyRole::Broker))
        .unwrap();

    let denied = h
        .workflow
        .submit_approval(
            &request.id,
            "carrier-1",
            Decision::Denied,
            Actor::new("carrier-1", PartyRole::Carrier),
        )
        .unwrap();
    assert_eq!(denied.derived_state(), RequestState::Denied);
    assert_eq!(denied.slot("shipper-1").unwrap().status, ApproverStatus::Moot);
    assert_eq!(denied.slot("broker-1").unwrap().status, ApproverStatus::Moot);

    for id in ["shipper-1", "broker-1"] {
        let result = h.workflow.submit_approval(
            &request.id,
            id,
            Decision::Confirmed,
            Actor::new(id, PartyRole::Shipper),
        );
        assert!(matches!(result, Err(ApprovalError::RequestAlreadySettled(_))));
    }

    // The denial and the settlement both land in the audit trail.
    let history = h.workflow.history(&request.id).unwrap();
    let confirmations = &history[1];
    assert!(confirmations
        .changes
        .iter()
        .any(|c| c.change_type == ChangeType::Denial));
    assert!(confirmations
        .changes
        .iter()
        .any(|c| c.change_type == ChangeType::Modification));
}

#[test]
fn test_untrusted_device_blocks_approval() {
    let h = harness();
    h.clear_gates("shipper-1", PartyRole::Shipper, 1);
    // broker-1 passes verification but never registers a device.
    let attempt = h
        .ledger
        .create_attempt("broker-1", 1, VerificationType::Email)
        .unwrap();
    h.ledger
        .record_result(
            &attempt.id,
            VerificationOutcome::Passed,
            AttemptMetadata::default(),
        )
        .unwrap();

    let request = h
        .workflow
        .open_request(
            small_rate(),
            vec!["shipper-1".to_string(), "broker-1".to_string()],
            Actor::new("broker-1", PartyRole::Broker),
        )
        .unwrap();

    let result = h.workflow.submit_approval(
        &request.id,
        "broker-1",
        Decision::Confirmed,
        Actor::new("broker-1", PartyRole::Broker),
    );
    assert!(matches!(result, Err(ApprovalError::TrustRequired(_))));

    // The request is untouched and the other approver can still proceed.
    let reloaded = h.workflow.get_request(&request.id).unwrap();
    assert_eq!(reloaded.slot("broker-1").unwrap().status, ApproverStatus::Pending);
    h.workflow
        .submit_approval(
            &request.id,
            "shipper-1",
            Decision::Confirmed,
            Actor::new("shipper-1", PartyRole::Shipper),
        )
        .unwrap();
}

#[test]
fn test_deactivated_device_loses_trust() {
    let h = harness();
    let device = h.clear_gates("carrier-1", PartyRole::Carrier, 1);

    h.registry.deactivate(&device.id).unwrap();

    let request = h
        .workflow
        .open_request(
            small_rate(),
            vec!["carrier-1".to_string()],
            Actor::new("broker-1", PartyRole::Broker),
        )
        .unwrap();

    let result = h.workflow.submit_approval(
        &request.id,
        "carrier-1",
        Decision::Confirmed,
        Actor::new("carrier-1", PartyRole::Carrier),
    );
    assert!(matches!(result, Err(ApprovalError::TrustRequired(_))));
}

#[test]
fn test_elevated_rate_requires_level_two() {
    let h = harness();
    // Trusted device but only a level-1 pass.
    h.clear_gates("broker-1", PartyRole::Broker, 1);

    let request = h
        .workflow
        .open_request(
            elevated_rate(),
            vec!["broker-1".to_string()],
            Actor::new("broker-1", PartyRole::Broker),
        )
        .unwrap();

    let result = h.workflow.submit_approval(
        &request.id,
        "broker-1",
        Decision::Confirmed,
        Actor::new("broker-1", PartyRole::Broker),
    );
    assert!(matches!(
        result,
        Err(ApprovalError::VerificationRequired { level: 2, .. })
    ));

    // A level-2 pass unblocks the same submission.
    let attempt = h
        .ledger
        .create_attempt("broker-1", 2, VerificationType::Face)
        .unwrap();
    h.ledger
        .record_result(
            &attempt.id,
            VerificationOutcome::Passed,
            AttemptMetadata::default(),
        )
        .unwrap();

    let approved = h
        .workflow
        .submit_approval(
            &request.id,
            "broker-1",
            Decision::Confirmed,
            Actor::new("broker-1", PartyRole::Broker),
        )
        .unwrap();
    assert_eq!(approved.derived_state(), RequestState::Approved);
}

#[test]
fn test_bill_of_lading_requires_level_two() {
    let h = harness();
    h.clear_gates("shipper-1", PartyRole::Shipper, 2);
    h.clear_gates("carrier-1", PartyRole::Carrier, 1);

    let request = h
        .workflow
        .open_request(
            ApprovalPayload::BillOfLading {
                document_id: "BOL-4401".to_string(),
                shipment_id: "SHIP-210".to_string(),
            },
            vec!["shipper-1".to_string(), "carrier-1".to_string()],
            Actor::new("broker-1", PartyRole::Broker),
        )
        .unwrap();

    h.workflow
        .submit_approval(
            &request.id,
            "shipper-1",
            Decision::Confirmed,
            Actor::new("shipper-1", PartyRole::Shipper),
        )
        .unwrap();

    let result = h.workflow.submit_approval(
        &request.id,
        "carrier-1",
        Decision::Confirmed,
        Actor::new("carrier-1", PartyRole::Carrier),
    );
    assert!(matches!(
        result,
        Err(ApprovalError::VerificationRequired { level: 2, .. })
    ));
}

#[test]
fn test_idempotent_resubmission_with_real_gates() {
    let h = harness();
    h.clear_gates("broker-1", PartyRole::Broker, 1);
    h.clear_gates("carrier-1", PartyRole::Carrier, 1);

    let request = h
        .workflow
        .open_request(
            small_rate(),
            vec!["broker-1".to_string(), "carrier-1".to_string()],
            Actor::new("broker-1", PartyRole::Broker),
        )
        .unwrap();

    h.workflow
        .submit_approval(
            &request.id,
            "broker-1",
            Decision::Confirmed,
            Actor::new("broker-1", PartyRole::Broker),
        )
        .unwrap();
    h.workflow
        .submit_approval(
            &request.id,
            "broker-1",
            Decision::Confirmed,
            Actor::new("broker-1", PartyRole::Broker),
        )
        .unwrap();

    let history = h.workflow.history(&request.id).unwrap();
    assert_eq!(history[1].changes.len(), 1);
}
