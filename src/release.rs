//! Release decision and publish orchestration.

pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod request;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::ReleaseError;
pub use orchestrator::{Collaborators, Orchestrator};
pub use outcome::{OutcomeReason, PublishReport, ReleaseOutcome};
pub use request::ReleaseRequest;
