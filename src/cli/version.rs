//! Version command.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use super::context::with_orchestrator;
use crate::release::ReleaseRequest;
use crate::utils::Secrets;

/// Version command options.
#[derive(Parser)]
pub struct VersionCommand {}

impl VersionCommand {
    /// Executes the version command.
    pub fn execute(self, request: &ReleaseRequest, secrets: &Secrets) -> Result<()> {
        let outcome = with_orchestrator(request, secrets, |release| Ok(release.version(request)?))?;
        info!(
            performed = outcome.performed,
            reason = %outcome.reason,
            "Version finished"
        );
        Ok(())
    }
}
