//! Changelog command.

use anyhow::Result;
use clap::Parser;

use super::context::with_orchestrator;
use crate::release::ReleaseRequest;
use crate::utils::Secrets;

/// Changelog command options.
#[derive(Parser)]
pub struct ChangelogCommand {
    /// Shows commits since the current version instead of the current release.
    #[arg(long, conflicts_with = "released")]
    pub unreleased: bool,

    /// Shows the changes of the current release (default).
    #[arg(long)]
    pub released: bool,
}

impl ChangelogCommand {
    /// Executes the changelog command.
    pub fn execute(self, request: &ReleaseRequest, secrets: &Secrets) -> Result<()> {
        let markdown = with_orchestrator(request, secrets, |release| {
            Ok(release.changelog(self.unreleased, request.post, request.noop)?)
        })?;
        print!("{markdown}");
        Ok(())
    }
}
