//! Resume and coarse-progress decisions.
//!
//! Everything here is derived on demand from the persisted step pointer and
//! the passport override. No phase value is ever stored.

use super::passport::{PassportOverride, PassportOverrideStore};
use super::store::ProgressStore;
use crate::steps::{Step, ENTRY_STEP};

/// Number of coarse phases shown by the progress indicator
pub const PHASE_COUNT: u8 = 3;

/// Reaching this step completes the first phase
pub const ADDRESS_BOUNDARY: Step = Step::Address;

/// Reaching this step completes the second phase
pub const LIVENESS_BOUNDARY: Step = Step::Liveness;

/// Where the user stands, from whichever source is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Ordinary flow, positioned by the saved step (if any)
    Normal(Option<Step>),
    /// Passport re-submission; phase count supplied by the override
    OverrideResubmission { completed_phases: u8 },
}

impl Progress {
    pub fn completed_phases(&self) -> u8 {
        match *self {
            Progress::OverrideResubmission { completed_phases } => {
                completed_phases.min(PHASE_COUNT)
            }
            Progress::Normal(None) => 0,
            Progress::Normal(Some(step)) => phase_for(step),
        }
    }
}

/// Project a step index onto the coarse phase scale
pub fn phase_for(step: Step) -> u8 {
    let index = step.index();
    if index >= LIVENESS_BOUNDARY.index() {
        2
    } else if index >= ADDRESS_BOUNDARY.index() {
        1
    } else {
        0
    }
}

/// What the dashboard entry card should offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDecision {
    /// User finished with a passport and must supply more data
    PassportUpdateRequired,
    /// Saved progress exists; ask whether to continue from it
    OfferResume(Step),
    StartFresh,
}

#[derive(Clone)]
pub struct ResumeDecider {
    progress: ProgressStore,
    passport: PassportOverrideStore,
}

impl ResumeDecider {
    pub fn new(progress: ProgressStore, passport: PassportOverrideStore) -> Self {
        Self { progress, passport }
    }

    pub fn progress(&self) -> Progress {
        match self.passport.load() {
            Some(PassportOverride {
                needs_update: true,
                completed_steps,
            }) => Progress::OverrideResubmission {
                completed_phases: completed_steps,
            },
            _ => Progress::Normal(self.progress.load()),
        }
    }

    pub fn completed_phases(&self) -> u8 {
        self.progress().completed_phases()
    }

    /// Step to send the user to instead of rendering the entry screen.
    ///
    /// Called by whichever screen starts the flow. Any location that is not
    /// another step of the wizard counts as the entry screen. Returns the saved
    /// step when it is past the entry screen but not yet in the
    /// processing/complete zone.
    pub fn redirect_target(&self, current_path: &str) -> Option<Step> {
        if let Some(current) = Step::from_path(current_path) {
            if current != ENTRY_STEP {
                return None;
            }
        }

        let saved = self.progress.load()?;
        if saved.is_after(ENTRY_STEP) && saved.is_before(Step::Processing) {
            tracing::debug!(%saved, "resuming verification");
            Some(saved)
        } else {
            None
        }
    }

    pub fn entry_decision(&self) -> EntryDecision {
        let passport_done = matches!(
            self.passport.load(),
            Some(PassportOverride {
                needs_update: true,
                completed_steps: PHASE_COUNT,
            })
        );
        if passport_done {
            return EntryDecision::PassportUpdateRequired;
        }

        match self.progress.load() {
            Some(step) if step != ENTRY_STEP => EntryDecision::OfferResume(step),
            _ => EntryDecision::StartFresh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::form_data::FormDataAccumulator;
    use crate::steps::VERIFICATION_STEPS;
    use crate::store::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn decider(store: &MemoryStore) -> (ResumeDecider, ProgressStore, PassportOverrideStore) {
        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        let forms = FormDataAccumulator::new(shared.clone(), "form");
        let progress = ProgressStore::new(shared.clone(), "progress", forms);
        let passport = PassportOverrideStore::new(shared, "passport");
        (
            ResumeDecider::new(progress.clone(), passport.clone()),
            progress,
            passport,
        )
    }

    #[test]
    fn test_phase_projection_boundaries() {
        let expected = [0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 2, 2, 2];
        for (step, phase) in VERIFICATION_STEPS.iter().zip(expected) {
            assert_eq!(phase_for(*step), phase, "phase for {step}");
        }
    }

    #[test]
    fn test_completed_phases_without_progress() {
        let store = MemoryStore::new();
        let (decider, _, _) = decider(&store);
        assert_eq!(decider.progress(), Progress::Normal(None));
        assert_eq!(decider.completed_phases(), 0);
    }

    #[test]
    fn test_completed_phases_follow_saved_step() {
        let store = MemoryStore::new();
        let (decider, progress, _) = decider(&store);

        progress.save(Step::MonthlyVolume);
        assert_eq!(decider.completed_phases(), 0);
        progress.save(Step::Address);
        assert_eq!(decider.completed_phases(), 1);
        progress.save(Step::Liveness);
        assert_eq!(decider.completed_phases(), 2);
    }

    #[test]
    fn test_override_takes_precedence() {
        let store = MemoryStore::new();
        let (decider, progress, passport) = decider(&store);

        progress.save(Step::Liveness);
        passport.set(Some(PassportOverride::needs_update(1)));

        assert_eq!(
            decider.progress(),
            Progress::OverrideResubmission {
                completed_phases: 1
            }
        );
        assert_eq!(decider.completed_phases(), 1);
    }

    #[test]
    fn test_inactive_override_falls_back_to_step() {
        let store = MemoryStore::new();
        let (decider, progress, passport) = decider(&store);

        progress.save(Step::Address);
        passport.set(Some(PassportOverride {
            needs_update: false,
            completed_steps: 3,
        }));

        assert_eq!(decider.progress(), Progress::Normal(Some(Step::Address)));
        assert_eq!(decider.completed_phases(), 1);
    }

    #[test]
    fn test_override_phase_count_clamped() {
        let progress = Progress::OverrideResubmission {
            completed_phases: 9,
        };
        assert_eq!(progress.completed_phases(), PHASE_COUNT);
    }

    #[test]
    fn test_redirect_to_mid_flow_step() {
        let store = MemoryStore::new();
        let (decider, progress, _) = decider(&store);

        progress.save(Step::Address);
        assert_eq!(decider.redirect_target("/verify"), Some(Step::Address));
    }

    #[test]
    fn test_no_redirect_without_progress() {
        let store = MemoryStore::new();
        let (decider, progress, _) = decider(&store);

        assert_eq!(decider.redirect_target("/verify"), None);

        progress.save(Step::Intro);
        assert_eq!(decider.redirect_target("/verify"), None);
    }

    #[test]
    fn test_no_redirect_into_terminal_zone() {
        let store = MemoryStore::new();
        store.insert_raw("progress", "/verify/processing");
        let (decider, _, _) = decider(&store);
        assert_eq!(decider.redirect_target("/verify"), None);

        store.insert_raw("progress", "/verify/complete");
        assert_eq!(decider.redirect_target("/verify"), None);

        store.insert_raw("progress", "/verify/liveness");
        assert_eq!(decider.redirect_target("/verify"), Some(Step::Liveness));
    }

    #[test]
    fn test_redirect_never_from_other_wizard_steps() {
        let store = MemoryStore::new();
        let (decider, progress, _) = decider(&store);

        progress.save(Step::Address);
        assert_eq!(decider.redirect_target("/verify/terms"), None);
        assert_eq!(decider.redirect_target("/verify/address"), None);
        assert_eq!(decider.redirect_target("/verify/liveness"), None);
    }

    #[test]
    fn test_redirect_from_external_start_screen() {
        let store = MemoryStore::new();
        let (decider, progress, _) = decider(&store);

        assert_eq!(decider.redirect_target("/start"), None);

        progress.save(Step::Address);
        assert_eq!(decider.redirect_target("/start"), Some(Step::Address));
        assert_eq!(decider.redirect_target("/verify"), Some(Step::Address));

        progress.save(Step::Processing);
        assert_eq!(decider.redirect_target("/start"), None);
    }

    #[test]
    fn test_stale_step_never_redirects() {
        let store = MemoryStore::new();
        store.insert_raw("progress", "/verify/old-selfie");
        let (decider, _, _) = decider(&store);
        assert_eq!(decider.redirect_target("/verify"), None);
        assert_eq!(decider.completed_phases(), 0);
    }

    #[test]
    fn test_entry_decision() {
        let store = MemoryStore::new();
        let (decider, progress, passport) = decider(&store);

        assert_eq!(decider.entry_decision(), EntryDecision::StartFresh);

        progress.save(Step::Intro);
        assert_eq!(decider.entry_decision(), EntryDecision::StartFresh);

        progress.save(Step::DocumentType);
        assert_eq!(
            decider.entry_decision(),
            EntryDecision::OfferResume(Step::DocumentType)
        );

        // Partial override counts do not trigger the passport dialog
        passport.set(Some(PassportOverride::needs_update(2)));
        assert_eq!(
            decider.entry_decision(),
            EntryDecision::OfferResume(Step::DocumentType)
        );

        passport.set(Some(PassportOverride::needs_update(PHASE_COUNT)));
        assert_eq!(
            decider.entry_decision(),
            EntryDecision::PassportUpdateRequired
        );
    }
}
