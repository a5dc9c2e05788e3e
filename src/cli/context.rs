//! Wiring of configuration and collaborators for a command.

use anyhow::{Context, Result};
use tracing::debug;

use crate::artifacts::{ShellDistributions, TwineUploader};
use crate::config::ReleaseConfig;
use crate::git::{GitRepository, ReleaseRepository};
use crate::history::parser_for;
use crate::hvcs::hvcs_for;
use crate::release::{Collaborators, Orchestrator, ReleaseRequest};
use crate::utils::Secrets;

/// Opens the repository, loads its configuration and runs `f` with an orchestrator.
pub(crate) fn with_orchestrator<T>(
    request: &ReleaseRequest,
    secrets: &Secrets,
    f: impl FnOnce(&Orchestrator<'_>) -> Result<T>,
) -> Result<T> {
    let git = GitRepository::open()
        .context("Failed to open git repository. Make sure you're in a git repository.")?;
    let root = git.workdir()?.to_path_buf();

    let config = ReleaseConfig::load(&root, &request.overrides)?;
    debug!(
        check_build_status = config.check_build_status,
        commit_subject = %config.commit_subject,
        commit_message = %config.commit_message,
        commit_parser = ?config.commit_parser,
        patch_without_tag = config.patch_without_tag,
        upload_to_pypi = config.upload_to_pypi,
        version_source = ?config.version_source,
        "Main config"
    );

    let vcs = ReleaseRepository::new(git, &config)?;
    let orchestrator = Orchestrator::new(
        &config,
        secrets,
        Collaborators {
            vcs: Box::new(vcs),
            hvcs: hvcs_for(&config, secrets)?,
            uploader: Box::new(TwineUploader::new(config.repository_url.clone())),
            dists: Box::new(ShellDistributions::new(
                &root,
                &config.dist_path,
                config.build_command.clone(),
            )),
            parser: parser_for(config.commit_parser),
        },
    );

    f(&orchestrator)
}
