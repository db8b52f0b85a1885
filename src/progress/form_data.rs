//! Partial answers accumulated across verification steps.

use std::sync::Arc;

use serde_json::Value;

use crate::store::KeyValueStore;

/// Field name to last-entered value
pub type FormData = serde_json::Map<String, Value>;

/// Field names other parts of the engine read
pub mod fields {
    pub const DOCUMENT_TYPE: &str = "documentType";
    pub const PASSPORT: &str = "passport";
}

/// Merge-on-write cache of form answers. Not a validator.
#[derive(Clone)]
pub struct FormDataAccumulator {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl FormDataAccumulator {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Shallow-merge `partial` over the saved answers.
    ///
    /// Keys in `partial` overwrite, keys not in `partial` are kept, and a
    /// `null` value removes the field.
    pub fn save(&self, partial: &FormData) {
        let mut current = self.load();
        for (field, value) in partial {
            if value.is_null() {
                current.remove(field);
            } else {
                current.insert(field.clone(), value.clone());
            }
        }

        let serialized = match serde_json::to_string(&current) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize verification form data");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.key, &serialized) {
            tracing::warn!(error = %e, "failed to persist verification form data");
        }
    }

    /// Saved answers, empty when unset or unreadable
    pub fn load(&self) -> FormData {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return FormData::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read verification form data");
                return FormData::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!("verification form data is not an object, ignoring");
                FormData::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed verification form data, ignoring");
                FormData::new()
            }
        }
    }

    /// A single saved field as text
    pub fn get_str(&self, field: &str) -> Option<String> {
        self.load()
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub(crate) fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(error = %e, "failed to clear verification form data");
        }
    }
}
