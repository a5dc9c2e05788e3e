//! The `version`, `publish` and `changelog` workflows.

use semver::Version;
use tracing::{debug, error, info, warn};

use super::{OutcomeReason, PublishReport, ReleaseError, ReleaseOutcome, ReleaseRequest};
use crate::artifacts::{Distributions, PackageUploader};
use crate::ci;
use crate::config::ReleaseConfig;
use crate::git::{PushTarget, Vcs};
use crate::history::{self, BumpLevel, CommitParser};
use crate::hvcs::Hvcs;
use crate::utils::Secrets;

/// External services a release talks to.
pub struct Collaborators<'a> {
    /// Version control.
    pub vcs: Box<dyn Vcs + 'a>,
    /// Hosting service.
    pub hvcs: Box<dyn Hvcs + 'a>,
    /// Package-index uploader.
    pub uploader: Box<dyn PackageUploader + 'a>,
    /// Distribution builder.
    pub dists: Box<dyn Distributions + 'a>,
    /// Commit message parser.
    pub parser: Box<dyn CommitParser>,
}

type EnvLookup<'a> = Box<dyn Fn(&str) -> Option<String> + 'a>;

/// Drives one release against explicit configuration and collaborators.
pub struct Orchestrator<'a> {
    config: &'a ReleaseConfig,
    secrets: &'a Secrets,
    vcs: Box<dyn Vcs + 'a>,
    hvcs: Box<dyn Hvcs + 'a>,
    uploader: Box<dyn PackageUploader + 'a>,
    dists: Box<dyn Distributions + 'a>,
    parser: Box<dyn CommitParser>,
    ci_env: EnvLookup<'a>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator reading CI variables from the process environment.
    pub fn new(
        config: &'a ReleaseConfig,
        secrets: &'a Secrets,
        collaborators: Collaborators<'a>,
    ) -> Self {
        let Collaborators {
            vcs,
            hvcs,
            uploader,
            dists,
            parser,
        } = collaborators;

        Self {
            config,
            secrets,
            vcs,
            hvcs,
            uploader,
            dists,
            parser,
            ci_env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Reads CI variables through `lookup` instead of the process environment.
    pub fn with_ci_env(mut self, lookup: impl Fn(&str) -> Option<String> + 'a) -> Self {
        self.ci_env = Box::new(lookup);
        self
    }

    /// Determines the next version and, unless told otherwise, writes and tags it.
    pub fn version(&self, request: &ReleaseRequest) -> Result<ReleaseOutcome, ReleaseError> {
        if request.retry {
            info!("Retrying publication of the same version");
        } else {
            info!("Creating new version");
        }

        let current = match self.vcs.current_version() {
            Ok(version) => version,
            Err(e) => {
                error!("{e:#}");
                return Ok(ReleaseOutcome::skipped(
                    OutcomeReason::VersionUnavailable,
                    None,
                    None,
                    BumpLevel::None,
                ));
            }
        };
        info!(version = %current, "Current version");

        // A retry publishes the current version again, so the pair shifts back one release.
        let (current, new, level) = if request.retry {
            let previous = match self.vcs.previous_version(&current) {
                Ok(previous) => previous,
                Err(e) => {
                    error!("Cannot find the release before {current}: {e:#}");
                    return Ok(ReleaseOutcome::skipped(
                        OutcomeReason::HistoryUnavailable,
                        None,
                        Some(current),
                        BumpLevel::None,
                    ));
                }
            };
            (previous, current, BumpLevel::None)
        } else {
            let level = match self.evaluate(&current, request.forced_level) {
                Ok(level) => level,
                Err(e) => {
                    error!("Cannot read commits since {current}: {e:#}");
                    return Ok(ReleaseOutcome::skipped(
                        OutcomeReason::HistoryUnavailable,
                        Some(current),
                        None,
                        BumpLevel::None,
                    ));
                }
            };
            let new = history::apply(&current, level);
            if new == current {
                info!("No release will be made");
                return Ok(ReleaseOutcome::skipped(
                    OutcomeReason::NoChange,
                    Some(current),
                    Some(new),
                    level,
                ));
            }
            (Some(current), new, level)
        };

        if request.noop {
            warn!(
                "No operation mode. Should have bumped from {} to {new}",
                display_version(current.as_ref())
            );
            return Ok(ReleaseOutcome::skipped(
                OutcomeReason::NoopMode,
                current,
                Some(new),
                level,
            ));
        }

        if self.config.check_build_status {
            if let Some(reason) = self.build_gate() {
                return Ok(ReleaseOutcome::skipped(reason, current, Some(new), level));
            }
        }

        if request.retry {
            return Ok(ReleaseOutcome::performed(
                OutcomeReason::Retried,
                current,
                new,
                level,
            ));
        }

        self.bump_and_commit(&new)
            .map_err(ReleaseError::VersionControl)?;
        info!(%level, version = %new, "Bumped version");

        Ok(ReleaseOutcome::performed(
            OutcomeReason::Released,
            current,
            new,
            level,
        ))
    }

    /// Runs [`version`](Self::version), then pushes and publishes the release.
    pub fn publish(&self, request: &ReleaseRequest) -> Result<PublishReport, ReleaseError> {
        let branch = self.config.branch.as_str();
        debug!(branch, "Running publish");
        ci::check_with(branch, &self.ci_env)?;

        if request.noop {
            debug!(branch, "No operation mode, not checking out");
        } else {
            self.vcs
                .checkout(branch)
                .map_err(ReleaseError::VersionControl)?;
        }

        let outcome = self.version(request)?;
        let Some(new_version) = outcome.new_version.clone().filter(|_| outcome.performed) else {
            return Ok(PublishReport {
                outcome,
                published: false,
                warnings: Vec::new(),
            });
        };

        let mut warnings = Vec::new();
        let (owner, name) = self
            .vcs
            .repository_owner_and_name()
            .map_err(ReleaseError::VersionControl)?;
        let tag = self.config.tag_name(&new_version);

        info!("Pushing new version");
        self.vcs
            .push_new_version(&PushTarget {
                credentials: self.hvcs.credentials(),
                owner: owner.clone(),
                name: name.clone(),
                branch: branch.to_string(),
                domain: self.hvcs.domain().to_string(),
            })
            .map_err(ReleaseError::VersionControl)?;

        let upload_pypi = self.config.upload_to_pypi;
        let upload_release = self.config.upload_to_release;

        if upload_pypi || upload_release {
            info!("Building distributions");
            if self.config.remove_dist {
                self.dists.remove().map_err(ReleaseError::Build)?;
            }
            self.dists.build().map_err(ReleaseError::Build)?;
        }

        if upload_pypi {
            info!("Uploading to package index");
            // Files already uploaded by the attempt being retried are not an error.
            self.uploader.upload(
                self.dists.dist_dir(),
                self.secrets.pypi_username.as_deref(),
                self.secrets.pypi_password.as_deref(),
                request.retry,
            )?;
        }

        if self.hvcs.check_token() {
            info!(hvcs = self.hvcs.name(), "Posting changelog");
            let posted = self.post_release_notes(
                &owner,
                &name,
                &tag,
                outcome.current_version.as_ref(),
                &new_version,
            );
            if let Err(e) = posted {
                warn!("Posting changelog failed: {e:#}");
                warnings.push(format!("Posting changelog failed: {e:#}"));
            }
        } else {
            warn!("Missing token: cannot post changelog to {}", self.hvcs.name());
            warnings.push("Missing token: changelog not posted".to_string());
        }

        if upload_release {
            if self.hvcs.check_token() {
                info!(hvcs = self.hvcs.name(), "Uploading release assets");
                self.hvcs
                    .upload_to_release(&owner, &name, &tag, self.dists.dist_dir())
                    .map_err(ReleaseError::Hosting)?;
            } else {
                warn!("Missing token: cannot upload release assets to {}", self.hvcs.name());
                warnings.push("Missing token: release assets not uploaded".to_string());
            }
        }

        if self.config.remove_dist {
            self.dists.remove().map_err(ReleaseError::Build)?;
        }

        info!(version = %new_version, "New release published");
        Ok(PublishReport {
            outcome,
            published: true,
            warnings,
        })
    }

    /// Renders the changelog of the current release, or of unreleased commits.
    ///
    /// With `post` (and not `noop`) the changelog is also posted to the
    /// hosting service. Returns the rendered markdown.
    pub fn changelog(
        &self,
        unreleased: bool,
        post: bool,
        noop: bool,
    ) -> Result<String, ReleaseError> {
        let current = self
            .vcs
            .current_version()
            .map_err(ReleaseError::CurrentVersion)?;
        let previous = self
            .vcs
            .previous_version(&current)
            .map_err(ReleaseError::VersionControl)?;

        let commits = if unreleased {
            self.vcs.commits_between(Some(&current), None)
        } else {
            self.vcs.commits_between(previous.as_ref(), Some(&current))
        }
        .map_err(ReleaseError::VersionControl)?;

        let log = history::generate_changelog(&commits, self.parser.as_ref());
        let markdown = history::markdown_changelog(&current, &log, false);

        if post && !noop {
            if self.hvcs.check_token() {
                let (owner, name) = self
                    .vcs
                    .repository_owner_and_name()
                    .map_err(ReleaseError::VersionControl)?;
                info!(hvcs = self.hvcs.name(), "Posting changelog");
                self.hvcs
                    .post_changelog(&owner, &name, &self.config.tag_name(&current), &markdown)
                    .map_err(ReleaseError::Hosting)?;
            } else {
                error!("Missing token: cannot post changelog to {}", self.hvcs.name());
            }
        }

        Ok(markdown)
    }

    fn evaluate(
        &self,
        current: &Version,
        forced: Option<BumpLevel>,
    ) -> anyhow::Result<BumpLevel> {
        if let Some(level) = forced {
            debug!(%level, "Using forced bump level");
            return Ok(level);
        }

        let commits = self.vcs.commits_between(Some(current), None)?;
        let level = history::evaluate(
            None,
            &commits,
            self.parser.as_ref(),
            self.config.patch_without_tag,
        );
        debug!(
            commits = commits.len(),
            parser = self.parser.name(),
            %level,
            "Evaluated bump level"
        );
        Ok(level)
    }

    /// `None` when the build passed, otherwise why the release stops.
    fn build_gate(&self) -> Option<OutcomeReason> {
        info!("Checking build status");
        let status = self.vcs.repository_owner_and_name().and_then(|(owner, name)| {
            let sha = self.vcs.current_head_hash()?;
            self.hvcs.check_build_status(&owner, &name, &sha)
        });

        match status {
            Ok(true) => {
                info!("The build was a success, continuing the release");
                None
            }
            Ok(false) => {
                warn!("The build failed, cancelling the release");
                Some(OutcomeReason::BuildFailed)
            }
            Err(e) => {
                warn!("Unable to determine the build status, cancelling the release: {e:#}");
                Some(OutcomeReason::BuildStatusUnknown)
            }
        }
    }

    fn bump_and_commit(&self, new: &Version) -> anyhow::Result<()> {
        self.vcs.set_new_version(new)?;
        if self.config.should_commit_version() {
            self.vcs.commit_new_version(new)?;
        }
        self.vcs.tag_new_version(new)
    }

    fn post_release_notes(
        &self,
        owner: &str,
        name: &str,
        tag: &str,
        previous: Option<&Version>,
        new: &Version,
    ) -> anyhow::Result<()> {
        let commits = self.vcs.commits_between(previous, Some(new))?;
        let log = history::generate_changelog(&commits, self.parser.as_ref());
        let markdown = history::markdown_changelog(new, &log, false);
        self.hvcs.post_changelog(owner, name, tag, &markdown)
    }
}

fn display_version(version: Option<&Version>) -> String {
    version.map_or_else(|| "nothing".to_string(), Version::to_string)
}
