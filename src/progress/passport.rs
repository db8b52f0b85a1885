//! Passport re-submission override record.
//!
//! Written by whoever decides the user must re-submit passport data, read by
//! the phase computation and the entry-card decision.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::KeyValueStore;

/// Persisted as `{"needsUpdate": bool, "completedSteps": n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportOverride {
    pub needs_update: bool,
    /// Coarse phases to report as done while the override is active
    pub completed_steps: u8,
}

impl PassportOverride {
    pub fn needs_update(completed_steps: u8) -> Self {
        Self {
            needs_update: true,
            completed_steps,
        }
    }
}

#[derive(Clone)]
pub struct PassportOverrideStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl PassportOverrideStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn load(&self) -> Option<PassportOverride> {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read passport override");
                return None;
            }
        };

        match serde_json::from_str::<Option<PassportOverride>>(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "malformed passport override, ignoring");
                None
            }
        }
    }

    /// Write the record, or delete it when `None`
    pub fn set(&self, record: Option<PassportOverride>) {
        let result = match record {
            Some(record) => match serde_json::to_string(&record) {
                Ok(json) => self.store.set(&self.key, &json),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize passport override");
                    return;
                }
            },
            None => self.store.remove(&self.key),
        };

        match result {
            Ok(()) => tracing::debug!(?record, "updated passport override"),
            Err(e) => tracing::warn!(error = %e, "failed to persist passport override"),
        }
    }
}
