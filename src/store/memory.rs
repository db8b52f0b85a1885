//! In-memory store with shared handles.
//!
//! Clones share the same backing map, which lets a test drop an engine and
//! build a new one over the same data to simulate an app reload.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{KeyValueStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    /// Whether storage is "disabled" (every operation fails)
    disabled: Arc<Mutex<bool>>,
    /// Total bytes (keys + values) the store may hold
    quota: Arc<Mutex<Option<usize>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that behaves like disabled browser storage
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.set_disabled(true);
        store
    }

    /// Create a store that rejects writes past `bytes` total
    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::new();
        if let Ok(mut quota) = store.quota.lock() {
            *quota = Some(bytes);
        }
        store
    }

    pub fn set_disabled(&self, disabled: bool) {
        if let Ok(mut flag) = self.disabled.lock() {
            *flag = disabled;
        }
    }

    /// Write a raw value, bypassing quota and availability checks.
    /// Used to plant stale or corrupt data.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    /// Raw view of a key, bypassing availability checks
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn checked_entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        let disabled = *self.disabled.lock().map_err(|_| StoreError::Unavailable)?;
        if disabled {
            return Err(StoreError::Unavailable);
        }
        self.entries.lock().map_err(|_| StoreError::Unavailable)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.checked_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let limit = *self.quota.lock().map_err(|_| StoreError::Unavailable)?;
        let mut entries = self.checked_entries()?;

        if let Some(limit) = limit {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.checked_entries()?.remove(key);
        Ok(())
    }
}
