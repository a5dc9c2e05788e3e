//! Publish command.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use super::context::with_orchestrator;
use crate::release::{PublishReport, ReleaseRequest};
use crate::utils::Secrets;

/// Publish command options.
#[derive(Parser)]
pub struct PublishCommand {}

impl PublishCommand {
    /// Executes the publish command.
    pub fn execute(self, request: &ReleaseRequest, secrets: &Secrets) -> Result<()> {
        let report = with_orchestrator(request, secrets, |release| Ok(release.publish(request)?))?;
        log_report(&report);
        Ok(())
    }
}

/// Summarises `report`; each warning was already logged where it arose.
fn log_report(report: &PublishReport) {
    if report.published {
        info!(warnings = report.warnings.len(), "Publish finished");
    } else {
        info!(reason = %report.outcome.reason, "Nothing published");
    }
}
