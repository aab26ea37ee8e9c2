//! SQLite storage for approval requests and step history
//!
//! Requests are read-modify-written under the workflow's per-request
//! lock. Step changes are insert-only: nothing ever updates or deletes a
//! history row.

use crate::history::{Actor, ChangeType, FieldDelta, StepChange, StepHistoryEntry};
use crate::request::{ApprovalPayload, ApprovalRequest, ApproverSlot};
use freightgate_core::PartyRole;
use rusqlite::{params, Connection};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from the approval store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request not found: {0}")]
    NotFound(String),

    #[error("Corrupt row for request {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// SQLite storage for approval requests and their audit trail
pub struct ApprovalStore {
    conn: Mutex<Connection>,
}

impl ApprovalStore {
    /// Create a new store with the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS approval_requests (
                id TEXT PRIMARY KEY,
                payload_json TEXT NOT NULL,
                approvers_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                settled_at TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_approval_requests_settled
             ON approval_requests(settled_at)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS step_changes (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                request_id TEXT NOT NULL,
                step_index INTEGER NOT NULL,
                label TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                description TEXT NOT NULL,
                actor_name TEXT NOT NULL,
                actor_role TEXT NOT NULL,
                change_type TEXT NOT NULL,
                field TEXT,
                old_value TEXT,
                new_value TEXT
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_step_changes_request
             ON step_changes(request_id)",
            [],
        )?;

        Ok(())
    }

    fn upsert_request(conn: &Connection, request: &ApprovalRequest) -> Result<(), StoreError> {
        let payload_json = serde_json::to_string(&request.payload)?;
        let approvers_json = serde_json::to_string(&request.approvers)?;

        conn.execute(
            "INSERT OR REPLACE INTO approval_requests
             (id, payload_json, approvers_json, created_at, settled_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.id,
                payload_json,
                approvers_json,
                request.created_at.to_rfc3339(),
                request.settled_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        Ok(())
    }

    fn insert_change(
        conn: &Connection,
        request_id: &str,
        step_index: u32,
        label: &str,
        change: &StepChange,
    ) -> Result<(), StoreError> {
        let (field, old_value, new_value) = match &change.detail {
            Some(delta) => (
                Some(delta.field.as_str()),
                delta.old_value.as_deref(),
                delta.new_value.as_deref(),
            ),
            None => (None, None, None),
        };

        conn.execute(
            "INSERT INTO step_changes
             (request_id, step_index, label, timestamp, description,
              actor_name, actor_role, change_type, field, old_value, new_value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                request_id,
                step_index,
                label,
                change.timestamp.to_rfc3339(),
                change.description,
                change.actor.name,
                change.actor.role.as_str(),
                change.change_type.as_str(),
                field,
                old_value,
                new_value,
            ],
        )?;

        Ok(())
    }

    /// Save a request (insert or replace)
    pub fn save(&self, request: &ApprovalRequest) -> Result<(), StoreError> {
        Self::upsert_request(&*self.lock()?, request)
    }

    /// Save a request and append history changes in a single transaction.
    ///
    /// The workflow commits each decision through this: either the request
    /// row and every change row land together, or none of them do, so the
    /// audit trail can never assert a decision the request does not hold.
    pub fn save_with_changes(
        &self,
        request: &ApprovalRequest,
        step_index: u32,
        label: &str,
        changes: &[&StepChange],
    ) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        Self::upsert_request(&tx, request)?;
        for change in changes {
            Self::insert_change(&tx, &request.id, step_index, label, change)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a request by ID
    pub fn get(&self, id: &str) -> Result<ApprovalRequest, StoreError> {
        let row = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id, payload_json, approvers_json, created_at, settled_at
                 FROM approval_requests WHERE id = ?1",
            )?;

            stmt.query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id.to_string()),
                other => StoreError::Database(other),
            })?
        };

        let corrupt = |reason: &str| StoreError::Corrupt {
            id: row.0.clone(),
            reason: reason.to_string(),
        };

        let payload: ApprovalPayload = serde_json::from_str(&row.1)?;
        let approvers: Vec<ApproverSlot> = serde_json::from_str(&row.2)?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&row.3)
            .map_err(|_| corrupt("bad created_at"))?
            .with_timezone(&chrono::Utc);
        let settled_at = match row.4 {
            Some(ref s) => Some(
                chrono::DateTime::parse_from_rfc3339(s)
                    .map_err(|_| corrupt("bad settled_at"))?
                    .with_timezone(&chrono::Utc),
            ),
            None => None,
        };

        Ok(ApprovalRequest {
            id: row.0,
            payload,
            approvers,
            created_at,
            settled_at,
        })
    }

    /// List unsettled requests, newest first
    pub fn list_open(&self) -> Result<Vec<ApprovalRequest>, StoreError> {
        let ids: Vec<String> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id FROM approval_requests
                 WHERE settled_at IS NULL ORDER BY created_at DESC",
            )?;

            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        let mut requests = Vec::new();
        for id in ids {
            requests.push(self.get(&id)?);
        }

        Ok(requests)
    }

    /// Append a change to a request's history. Insert-only.
    pub fn append_change(
        &self,
        request_id: &str,
        step_index: u32,
        label: &str,
        change: &StepChange,
    ) -> Result<(), StoreError> {
        Self::insert_change(&*self.lock()?, request_id, step_index, label, change)
    }

    /// Reassemble a request's history, grouped by step, changes in
    /// insertion order.
    pub fn history(&self, request_id: &str) -> Result<Vec<StepHistoryEntry>, StoreError> {
        let rows: Vec<(u32, String, String, String, String, String, String, Option<String>, Option<String>, Option<String>)> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT step_index, label, timestamp, description, actor_name,
                        actor_role, change_type, field, old_value, new_value
                 FROM step_changes WHERE request_id = ?1 ORDER BY seq ASC",
            )?;

            let rows = stmt
                .query_map(params![request_id], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                        row.get(9)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let corrupt = |reason: &str| StoreError::Corrupt {
            id: request_id.to_string(),
            reason: reason.to_string(),
        };

        let mut entries: Vec<StepHistoryEntry> = Vec::new();
        for (step_index, label, timestamp, description, actor_name, actor_role, change_type, field, old_value, new_value) in rows {
            let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|_| corrupt("bad timestamp"))?
                .with_timezone(&chrono::Utc);
            let role = PartyRole::from_str(&actor_role).map_err(|_| corrupt("bad actor role"))?;
            let change_type =
                ChangeType::from_str(&change_type).ok_or_else(|| corrupt("bad change type"))?;
            let detail = field.map(|field| FieldDelta {
                field,
                old_value,
                new_value,
            });

            let change = StepChange {
                timestamp,
                description,
                actor: Actor::new(actor_name, role),
                change_type,
                detail,
            };

            match entries.last_mut() {
                Some(entry) if entry.step_index == step_index => entry.changes.push(change),
                _ => entries.push(StepHistoryEntry {
                    step_index,
                    label,
                    changes: vec![change],
                }),
            }
        }

        Ok(entries)
    }
}
