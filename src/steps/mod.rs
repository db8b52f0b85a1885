//! Verification step catalogue and ordering

pub mod sequence;

pub use sequence::{index_of, is_known, Step, ENTRY_STEP, VERIFICATION_STEPS};
