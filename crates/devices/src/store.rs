//! SQLite storage for registered devices

use crate::device::RegisteredDevice;
use crate::fingerprint::DeviceFingerprint;
use freightgate_core::PartyRole;
use rusqlite::{params, Connection};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from the device store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Corrupt row for device {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// SQLite storage for registered devices
pub struct DeviceStore {
    conn: Mutex<Connection>,
}

impl DeviceStore {
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
            "CREATE TABLE IF NOT EXISTS registered_devices (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                fingerprint_json TEXT NOT NULL,
                push_token TEXT NOT NULL,
                last_used TEXT NOT NULL,
                active INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_registered_devices_user
             ON registered_devices(user_id)",
            [],
        )?;

        Ok(())
    }

    /// Save a device (insert or replace)
    pub fn save(&self, device: &RegisteredDevice) -> Result<(), StoreError> {
        let fingerprint_json = serde_json::to_string(&device.fingerprint)?;

        self.lock()?.execute(
            "INSERT OR REPLACE INTO registered_devices
             (id, user_id, role, fingerprint_json, push_token, last_used, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                device.id,
                device.user_id,
                device.role.as_str(),
                fingerprint_json,
                device.push_token,
                device.last_used.to_rfc3339(),
                device.active as i64,
                device.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Get a device by ID
    pub fn get(&self, id: &str) -> Result<RegisteredDevice, StoreError> {
        let row = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id, user_id, role, fingerprint_json, push_token, last_used,
                        active, created_at
                 FROM registered_devices WHERE id = ?1",
            )?;

            stmt.query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, String>(7)?,
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

        let role = PartyRole::from_str(&row.2).map_err(|_| corrupt("bad role"))?;
        let fingerprint: DeviceFingerprint = serde_json::from_str(&row.3)?;
        let last_used = chrono::DateTime::parse_from_rfc3339(&row.5)
            .map_err(|_| corrupt("bad last_used"))?
            .with_timezone(&chrono::Utc);
        let created_at = chrono::DateTime::parse_from_rfc3339(&row.7)
            .map_err(|_| corrupt("bad created_at"))?
            .with_timezone(&chrono::Utc);

        Ok(RegisteredDevice {
            id: row.0,
            user_id: row.1,
            role,
            fingerprint,
            push_token: row.4,
            last_used,
            active: row.6 != 0,
            created_at,
        })
    }

    /// List all devices registered to a user
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<RegisteredDevice>, StoreError> {
        let ids: Vec<String> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT id FROM registered_devices
                 WHERE user_id = ?1 ORDER BY created_at DESC",
            )?;

            let ids = stmt
                .query_map(params![user_id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };

        let mut devices = Vec::new();
        for id in ids {
            devices.push(self.get(&id)?);
        }

        Ok(devices)
    }
}
