//! Step history - the append-only audit trail
//!
//! One history entry exists per workflow step; changes are appended as
//! sub-events occur within that step and are never mutated afterwards.

use chrono::{DateTime, Utc};
use freightgate_core::PartyRole;
use serde::{Deserialize, Serialize};

/// Who made a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: PartyRole,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: PartyRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// What kind of change was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Creation,
    Modification,
    Acceptance,
    Denial,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Creation => "creation",
            ChangeType::Modification => "modification",
            ChangeType::Acceptance => "acceptance",
            ChangeType::Denial => "denial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "creation" => Some(ChangeType::Creation),
            "modification" => Some(ChangeType::Modification),
            "acceptance" => Some(ChangeType::Acceptance),
            "denial" => Some(ChangeType::Denial),
            _ => None,
        }
    }
}

/// A field-level delta carried by a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDelta {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

/// A single audit event within a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepChange {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub actor: Actor,
    pub change_type: ChangeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<FieldDelta>,
}

impl StepChange {
    pub fn new(
        description: impl Into<String>,
        actor: Actor,
        change_type: ChangeType,
        detail: Option<FieldDelta>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            description: description.into(),
            actor,
            change_type,
            detail,
        }
    }
}

/// All changes recorded within one workflow step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepHistoryEntry {
    pub step_index: u32,
    pub label: String,
    pub changes: Vec<StepChange>,
}
