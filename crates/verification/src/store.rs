//! SQLite storage for verification attempts

use crate::attempt::{
    AttemptMetadata, SecurityLevel, VerificationAttempt, VerificationStatus, VerificationType,
};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from the verification store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Attempt not found: {0}")]
    NotFound(String),

    #[error("Corrupt row for attempt {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// SQLite storage for verification attempts.
///
/// The connection sits behind a mutex so the store can be shared across
/// request handlers; every operation is a single atomic statement or a
/// read-modify-write done by the ledger while it holds the row's fate.
pub struct VerificationStore {
    conn: Mutex<Connection>,
}

impl VerificationStore {
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
            "CREATE TABLE IF NOT EXISTS verification_attempts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                level INTEGER NOT NULL,
                vtype TEXT NOT NULL,
                status TEXT NOT NULL,
                attempted_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                attempt_count INTEGER NOT NULL,
                metadata_json TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_verification_attempts_user
             ON verification_attempts(user_id)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_verification_attempts_status
             ON verification_attempts(status)",
            [],
        )?;

        Ok(())
    }

    /// Save an attempt (insert or replace)
    pub fn save(&self, attempt: &VerificationAttempt) -> Result<(), StoreError> {
        let metadata_json = serde_json::to_string(&attempt.metadata)?;

        self.lock()?.execute(
            "INSERT OR REPLACE INTO verification_attempts
             (id, user_id, level, vtype, status, attempted_at, expires_at,
              attempt_count, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                attempt.id,
                attempt.user_id,
                attempt.level.as_u8(),
                attempt.vtype.as_str(),
                attempt.status.as_str(),
                attempt.attempted_at.to_rfc3339(),
                attempt.expires_at.to_rfc3339(),
                attempt.attempt_count,
                metadata_json,
            ],
        )?;

        Ok(())
    }

    /// Get an attempt by ID
    pub fn get(&self, id: &str) -> Result<VerificationAttempt, StoreError> {
        let row = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id, user_id, level, vtype, status, attempted_at, expires_at,
                        attempt_count, metadata_json
                 FROM verification_attempts WHERE id = ?1",
            )?;

            stmt.query_row(params![id], |row| {
                Ok(RawAttempt {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    level: row.get(2)?,
                    vtype: row.get(3)?,
                    status: row.get(4)?,
                    attempted_at: row.get(5)?,
                    expires_at: row.get(6)?,
                    attempt_count: row.get(7)?,
                    metadata_json: row.get(8)?,
                })
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id.to_string()),
                other => StoreError::Database(other),
            })?
        };

        row.into_attempt()
    }

    /// List all attempts for a user, newest first
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<VerificationAttempt>, StoreError> {
        let ids: Vec<String> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id FROM verification_attempts
                 WHERE user_id = ?1 ORDER BY attempted_at DESC",
            )?;

            let ids = stmt
                .query_map(params![user_id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        let mut attempts = Vec::new();
        for id in ids {
            attempts.push(self.get(&id)?);
        }

        Ok(attempts)
    }

    /// List passed attempts for a user (for gate checks)
    pub fn list_passed_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<VerificationAttempt>, StoreError> {
        let ids: Vec<String> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id FROM verification_attempts
                 WHERE user_id = ?1 AND status = 'passed'
                 ORDER BY attempted_at DESC",
            )?;

            let ids = stmt
                .query_map(params![user_id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        let mut attempts = Vec::new();
        for id in ids {
            attempts.push(self.get(&id)?);
        }

        Ok(attempts)
    }

    /// Mark pending attempts past their expiry as expired.
    /// Returns how many rows were swept.
    pub fn expire_stale(&self) -> Result<usize, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        let rows = self.lock()?.execute(
            "UPDATE verification_attempts
             SET status = 'expired'
             WHERE status = 'pending' AND expires_at < ?1",
            params![now],
        )?;

        Ok(rows)
    }
}

/// Row as pulled from SQLite, before parsing
struct RawAttempt {
    id: String,
    user_id: String,
    level: u8,
    vtype: String,
    status: String,
    attempted_at: String,
    expires_at: String,
    attempt_count: u32,
    metadata_json: String,
}

impl RawAttempt {
    fn into_attempt(self) -> Result<VerificationAttempt, StoreError> {
        let corrupt = |reason: &str| StoreError::Corrupt {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        let level = SecurityLevel::from_u8(self.level).ok_or_else(|| corrupt("bad level"))?;
        let vtype = VerificationType::from_str(&self.vtype).ok_or_else(|| corrupt("bad type"))?;
        let status =
            VerificationStatus::from_str(&self.status).ok_or_else(|| corrupt("bad status"))?;
        let attempted_at = chrono::DateTime::parse_from_rfc3339(&self.attempted_at)
            .map_err(|_| corrupt("bad attempted_at"))?
            .with_timezone(&chrono::Utc);
        let expires_at = chrono::DateTime::parse_from_rfc3339(&self.expires_at)
            .map_err(|_| corrupt("bad expires_at"))?
            .with_timezone(&chrono::Utc);
        let metadata: AttemptMetadata = serde_json::from_str(&self.metadata_json)?;

        Ok(VerificationAttempt {
            id: self.id,
            user_id: self.user_id,
            level,
            vtype,
            status,
            attempted_at,
            expires_at,
            attempt_count: self.attempt_count,
            metadata,
        })
    }
}
