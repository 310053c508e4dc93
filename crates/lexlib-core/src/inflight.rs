//! Duplicate-submit guard for mutating operations.
//!
//! At most one mutation per `(operation, target)` key runs at a time. A
//! second identical request while the first is outstanding is rejected with
//! [`Error::Conflict`]; the key is released when the returned permit drops.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct InflightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InflightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `(operation, target)` or fail if it is already claimed.
    pub fn try_acquire(&self, operation: &str, target: &str) -> Result<InflightPermit> {
        let key = format!("{}:{}", operation, target);
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| Error::Internal("in-flight registry poisoned".to_string()))?;
        if !keys.insert(key.clone()) {
            debug!(op = operation, target, "Rejecting duplicate in-flight request");
            return Err(Error::Conflict(format!(
                "{} on {} is already in progress",
                operation, target
            )));
        }
        Ok(InflightPermit {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    /// Number of operations currently in flight.
    pub fn len(&self) -> usize {
        self.keys.lock().map(|k| k.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct InflightPermit {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InflightPermit {
    fn drop(&mut self) {
        if let Ok(mut keys) = self.keys.lock() {
            keys.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_identical_request_conflicts() {
        let guard = InflightGuard::new();
        let permit = guard.try_acquire("delete_document", "abc").unwrap();
        let err = guard.try_acquire("delete_document", "abc").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        drop(permit);
        assert!(guard.try_acquire("delete_document", "abc").is_ok());
    }

    #[test]
    fn test_distinct_keys_do_not_conflict() {
        let guard = InflightGuard::new();
        let _a = guard.try_acquire("delete_document", "abc").unwrap();
        let _b = guard.try_acquire("delete_document", "def").unwrap();
        let _c = guard.try_acquire("update_document", "abc").unwrap();
        assert_eq!(guard.len(), 3);
    }

    #[test]
    fn test_clones_share_state() {
        let guard = InflightGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire("upload", "batch").unwrap();
        assert!(other.try_acquire("upload", "batch").is_err());
    }
}
