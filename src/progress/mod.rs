//! Verification progress engine.
//!
//! Tracks how far a user got through the verification wizard, keeps the
//! answers they typed along the way, and decides whether a returning user is
//! resumed or started over. All state lives in a [`KeyValueStore`]; every
//! persistence failure degrades to "start fresh" and is only logged.

pub mod form_data;
pub mod passport;
pub mod resume;
pub mod store;

use std::sync::Arc;

pub use form_data::{fields, FormData, FormDataAccumulator};
pub use passport::{PassportOverride, PassportOverrideStore};
pub use resume::{EntryDecision, Progress, ResumeDecider, PHASE_COUNT};
pub use store::ProgressStore;

use crate::config::StorageConfig;
use crate::steps::{Step, ENTRY_STEP};
use crate::store::KeyValueStore;

/// Result of reporting a navigation to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Location is not part of the verification flow
    NotInFlow,
    /// Step recorded as the new furthest point
    Saved(Step),
    /// Known step, but nothing to record (already reached, processing, or storage failed)
    Skipped(Step),
    /// Flow completed; progress and form data wiped
    Cleared,
}

/// Entry point used by step screens and the dashboard
#[derive(Clone)]
pub struct VerificationProgress {
    progress: ProgressStore,
    form_data: FormDataAccumulator,
    passport: PassportOverrideStore,
    resume: ResumeDecider,
}

impl VerificationProgress {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: &StorageConfig) -> Self {
        let form_data = FormDataAccumulator::new(store.clone(), keys.form_data_key.clone());
        let progress =
            ProgressStore::new(store.clone(), keys.progress_key.clone(), form_data.clone());
        let passport = PassportOverrideStore::new(store, keys.passport_key.clone());
        let resume = ResumeDecider::new(progress.clone(), passport.clone());

        Self {
            progress,
            form_data,
            passport,
            resume,
        }
    }

    /// Called whenever a screen becomes active.
    ///
    /// Records forward progress for ordinary steps, merges any answers the
    /// screen supplies, and wipes everything once the complete step is shown.
    pub fn on_navigate(&self, path: &str, partial: Option<&FormData>) -> NavigationOutcome {
        let Some(step) = Step::from_path(path) else {
            return NavigationOutcome::NotInFlow;
        };

        if step == Step::Complete {
            self.progress.clear();
            return NavigationOutcome::Cleared;
        }

        if let Some(partial) = partial {
            self.form_data.save(partial);
        }

        if step.is_terminal() {
            return NavigationOutcome::Skipped(step);
        }

        let advanced = self
            .progress
            .load()
            .map_or(true, |saved| step.is_after(saved));
        if advanced && self.progress.save(step) {
            NavigationOutcome::Saved(step)
        } else {
            NavigationOutcome::Skipped(step)
        }
    }

    pub fn save_progress(&self, path: &str) -> bool {
        self.progress.save_path(path)
    }

    pub fn get_saved_progress(&self) -> Option<Step> {
        self.progress.load()
    }

    pub fn clear_progress(&self) {
        self.progress.clear();
    }

    pub fn save_form_data(&self, partial: &FormData) {
        self.form_data.save(partial);
    }

    pub fn get_form_data(&self) -> FormData {
        self.form_data.load()
    }

    pub fn progress(&self) -> Progress {
        self.resume.progress()
    }

    pub fn completed_phases(&self) -> u8 {
        self.resume.completed_phases()
    }

    /// True once every coarse phase is done
    pub fn is_verified(&self) -> bool {
        self.completed_phases() >= PHASE_COUNT
    }

    pub fn redirect_target(&self, current_path: &str) -> Option<Step> {
        self.resume.redirect_target(current_path)
    }

    pub fn entry_decision(&self) -> EntryDecision {
        self.resume.entry_decision()
    }

    pub fn passport_status(&self) -> Option<PassportOverride> {
        self.passport.load()
    }

    pub fn set_passport_status(&self, record: Option<PassportOverride>) {
        self.passport.set(record);
    }

    /// Liveness photo accepted. Users who chose a passport are flagged for
    /// re-submission; returns whether the flag was raised.
    pub fn submit_liveness(&self) -> bool {
        let document_type = self.form_data.get_str(fields::DOCUMENT_TYPE);
        let is_passport = document_type.as_deref() == Some(fields::PASSPORT);
        if is_passport {
            self.passport
                .set(Some(PassportOverride::needs_update(PHASE_COUNT)));
            tracing::info!("passport verification flagged for update");
        }
        is_passport
    }

    /// "Start over": wipe progress and answers, return where to go
    pub fn restart(&self) -> Step {
        self.progress.clear();
        ENTRY_STEP
    }

    /// Accept the passport update prompt: wipe everything including the override
    pub fn confirm_passport_update(&self) -> Step {
        self.progress.clear();
        self.passport.set(None);
        ENTRY_STEP
    }
}
