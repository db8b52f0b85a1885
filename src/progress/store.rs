//! Persisted "furthest step reached" pointer.

use std::sync::Arc;

use super::form_data::FormDataAccumulator;
use crate::steps::Step;
use crate::store::KeyValueStore;

/// Single persisted step pointer that only ever moves forward until cleared
#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    form_data: FormDataAccumulator,
}

impl ProgressStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        form_data: FormDataAccumulator,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            form_data,
        }
    }

    /// Persist `step` if it is further along than the saved step.
    ///
    /// Returns true only when the record was actually written. Backward moves,
    /// repeats and storage failures all leave the record untouched.
    pub fn save(&self, step: Step) -> bool {
        if let Some(current) = self.load() {
            if !step.is_after(current) {
                tracing::trace!(%step, %current, "progress not advanced");
                return false;
            }
        }

        match self.store.set(&self.key, step.path()) {
            Ok(()) => {
                tracing::debug!(%step, "saved verification progress");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, %step, "failed to persist verification progress");
                false
            }
        }
    }

    /// Save a raw route token. Tokens outside the catalogue are ignored.
    pub fn save_path(&self, path: &str) -> bool {
        match Step::from_path(path) {
            Some(step) => self.save(step),
            None => {
                tracing::debug!(path, "ignoring save for unknown verification step");
                false
            }
        }
    }

    /// The saved step, or `None` when absent, unreadable or no longer in the catalogue
    pub fn load(&self) -> Option<Step> {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read verification progress");
                return None;
            }
        };

        let step = Step::from_path(&raw);
        if step.is_none() {
            tracing::warn!(value = %raw, "discarding stale verification progress");
        }
        step
    }

    /// Delete the step pointer together with the accumulated form data
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            tracing::warn!(error = %e, "failed to clear verification progress");
        }
        self.form_data.clear();
        tracing::debug!("cleared verification progress");
    }
}
