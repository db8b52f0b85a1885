//! kyc-progress - resumable progress tracking for identity verification flows
//!
//! The library exposes the step catalogue, the persistence abstraction and the
//! progress engine used by both the CLI and embedding front ends.

pub mod config;
pub mod logging;
pub mod progress;
pub mod steps;
pub mod store;

pub use progress::{NavigationOutcome, VerificationProgress};
pub use steps::Step;
