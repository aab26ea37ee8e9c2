//! Per-request lock registry
//!
//! `submit_approval` calls for the same request id must be mutually
//! exclusive so two approvers cannot race past the settled check and
//! both write a terminal decision. Locks are keyed by request id and
//! created on first use; they are never reclaimed, which is fine at the
//! request volumes a brokerage sees.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of one mutex per request id
#[derive(Default)]
pub struct RequestLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RequestLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or create) the lock for a request id. The caller locks the
    /// returned mutex for the duration of its read-modify-write.
    pub fn for_request(&self, request_id: &str) -> Option<Arc<Mutex<()>>> {
        let mut map = self.inner.lock().ok()?;
        Some(
            map.entry(request_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_same_lock() {
        let locks = RequestLocks::new();
        let a = locks.for_request("REQ-1").unwrap();
        let b = locks.for_request("REQ-1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_different_ids_different_locks() {
        let locks = RequestLocks::new();
        let a = locks.for_request("REQ-1").unwrap();
        let b = locks.for_request("REQ-2").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_mutual_exclusion() {
        let locks = Arc::new(RequestLocks::new());
        let lock = locks.for_request("REQ-1").unwrap();
        let guard = lock.lock().unwrap();

        let other = locks.for_request("REQ-1").unwrap();
        assert!(other.try_lock().is_err());

        drop(guard);
        assert!(other.try_lock().is_ok());
    }
}
