//! Canonical ordering of the verification wizard.
//!
//! All ordering questions are answered by position in [`VERIFICATION_STEPS`],
//! so comparisons between steps are integer comparisons rather than path
//! comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One screen of the verification wizard, identified by its route token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Step {
    /// Flow entry screen
    Intro,
    Terms,
    /// Overview of what the user is about to provide
    StepOverview,
    PersonalInfo,
    MonthlyVolume,
    Address,
    DocumentType,
    DocumentUpload,
    CaptureFront,
    CaptureBack,
    Liveness,
    /// Terminal: waiting on the backend decision
    Processing,
    /// Terminal: flow finished
    Complete,
}

/// The wizard in order. Position in this table is the step index.
pub const VERIFICATION_STEPS: [Step; 13] = [
    Step::Intro,
    Step::Terms,
    Step::StepOverview,
    Step::PersonalInfo,
    Step::MonthlyVolume,
    Step::Address,
    Step::DocumentType,
    Step::DocumentUpload,
    Step::CaptureFront,
    Step::CaptureBack,
    Step::Liveness,
    Step::Processing,
    Step::Complete,
];

/// The screen every fresh flow starts on
pub const ENTRY_STEP: Step = Step::Intro;

impl Step {
    /// Route token persisted for this step
    pub fn path(self) -> &'static str {
        match self {
            Step::Intro => "/verify",
            Step::Terms => "/verify/terms",
            Step::StepOverview => "/verify/steps",
            Step::PersonalInfo => "/verify/personal-info",
            Step::MonthlyVolume => "/verify/monthly-volume",
            Step::Address => "/verify/address",
            Step::DocumentType => "/verify/document-type",
            Step::DocumentUpload => "/verify/document-upload",
            Step::CaptureFront => "/verify/document-capture-front",
            Step::CaptureBack => "/verify/document-capture-back",
            Step::Liveness => "/verify/liveness",
            Step::Processing => "/verify/processing",
            Step::Complete => "/verify/complete",
        }
    }

    /// Look up a step by route token. Anything outside the catalogue is `None`.
    pub fn from_path(path: &str) -> Option<Step> {
        VERIFICATION_STEPS.iter().copied().find(|s| s.path() == path)
    }

    /// Position in the canonical order
    pub fn index(self) -> usize {
        // The table holds every variant, so the fallback is unreachable.
        VERIFICATION_STEPS
            .iter()
            .position(|s| *s == self)
            .unwrap_or(usize::MAX)
    }

    /// Processing and complete are reached only by finishing the flow
    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Processing | Step::Complete)
    }

    pub fn is_before(self, other: Step) -> bool {
        self.index() < other.index()
    }

    pub fn is_after(self, other: Step) -> bool {
        self.index() > other.index()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl TryFrom<String> for Step {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Step::from_path(&value).ok_or_else(|| format!("unknown verification step: {value}"))
    }
}

impl From<Step> for String {
    fn from(step: Step) -> Self {
        step.path().to_string()
    }
}

/// Index of a raw route token, `None` when it is not part of the flow
pub fn index_of(path: &str) -> Option<usize> {
    Step::from_path(path).map(Step::index)
}

/// Whether a navigation location names a step of this flow
pub fn is_known(path: &str) -> bool {
    Step::from_path(path).is_some()
}
