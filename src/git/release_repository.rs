//! [`Vcs`] implementation over a git2 repository and the release configuration.

use std::path::Path;

use anyhow::{Context, Result};
use git2::Signature;
use semver::Version;
use tracing::{debug, info};

use super::{GitRepository, PushTarget, Vcs, VersionVariable};
use crate::config::{ReleaseConfig, VersionSource};
use crate::history::CommitEntry;

/// A git repository viewed through the release configuration.
pub struct ReleaseRepository<'a> {
    git: GitRepository,
    config: &'a ReleaseConfig,
    version_variable: Option<VersionVariable>,
}

impl<'a> ReleaseRepository<'a> {
    /// Wraps `git` using `config` for version location, tags and commit identity.
    pub fn new(git: GitRepository, config: &'a ReleaseConfig) -> Result<Self> {
        let version_variable = config
            .version_variable
            .as_deref()
            .map(str::parse::<VersionVariable>)
            .transpose()?;

        Ok(Self {
            git,
            config,
            version_variable,
        })
    }

    /// The underlying repository.
    pub fn git(&self) -> &GitRepository {
        &self.git
    }

    /// All released versions, ascending.
    fn released_versions(&self) -> Result<Vec<Version>> {
        let mut versions: Vec<Version> = self
            .git
            .tag_names()?
            .iter()
            .filter_map(|tag| self.config.parse_tag(tag))
            .collect();
        versions.sort();
        Ok(versions)
    }

    fn signature(&self) -> Result<Signature<'static>> {
        let author = self.config.commit_author.trim();
        let (name, email) = match author.split_once('<') {
            Some((name, rest)) => (name.trim(), rest.trim_end_matches('>').trim()),
            None => (author, ""),
        };
        Signature::now(name, email)
            .with_context(|| format!("Invalid commit_author: {}", self.config.commit_author))
    }

    fn version_variable(&self) -> Result<&VersionVariable> {
        self.version_variable
            .as_ref()
            .context("version_variable is not configured")
    }

    fn workdir(&self) -> Result<&Path> {
        self.git.workdir()
    }
}

impl Vcs for ReleaseRepository<'_> {
    fn checkout(&self, branch: &str) -> Result<()> {
        if self.git.get_current_branch().ok().as_deref() == Some(branch) {
            debug!(branch, "Already on release branch");
            return Ok(());
        }
        debug!(branch, "Checking out release branch");
        self.git.checkout_branch(branch)
    }

    fn current_version(&self) -> Result<Version> {
        match self.config.version_source {
            VersionSource::Commit => self.version_variable()?.read(self.workdir()?),
            VersionSource::Tag => Ok(self
                .released_versions()?
                .pop()
                .unwrap_or_else(|| Version::new(0, 0, 0))),
        }
    }

    fn previous_version(&self, version: &Version) -> Result<Option<Version>> {
        Ok(self
            .released_versions()?
            .into_iter()
            .filter(|v| v < version)
            .max())
    }

    fn commits_between(
        &self,
        from: Option<&Version>,
        to: Option<&Version>,
    ) -> Result<Vec<CommitEntry>> {
        let end = match to {
            Some(version) => {
                let tag = self.config.tag_name(version);
                match self.git.tag_target(&tag)? {
                    Some(oid) => oid,
                    None => {
                        debug!(tag = %tag, "Release tag not found, reading up to HEAD");
                        self.git.head_oid()?
                    }
                }
            }
            None => self.git.head_oid()?,
        };

        let start = match from {
            Some(version) => self.git.tag_target(&self.config.tag_name(version))?,
            None => None,
        };

        // Without a tag, the release commit itself marks where `from` begins.
        let release_subject = match (from, start) {
            (Some(version), None) => Some(self.config.version_commit_subject(version)),
            _ => None,
        };

        self.git.commits_between(start, end, |message| {
            release_subject
                .as_deref()
                .is_some_and(|subject| message.lines().next().map(str::trim) == Some(subject))
        })
    }

    fn set_new_version(&self, version: &Version) -> Result<()> {
        match &self.version_variable {
            Some(variable) => {
                info!(file = %variable.path.display(), %version, "Writing new version");
                variable.write(self.workdir()?, version)
            }
            None => {
                debug!("No version_variable configured, version lives in tags only");
                Ok(())
            }
        }
    }

    fn commit_new_version(&self, version: &Version) -> Result<()> {
        let paths: Vec<&Path> = self
            .version_variable
            .iter()
            .map(|variable| variable.path.as_path())
            .collect();
        let message = self.config.version_commit_message(version);
        let oid = self.git.commit_paths(&paths, &message, &self.signature()?)?;
        info!(commit = %oid, "Committed new version");
        Ok(())
    }

    fn tag_new_version(&self, version: &Version) -> Result<()> {
        let tag = self.config.tag_name(version);
        self.git.create_tag(&tag, &self.signature()?)?;
        info!(tag = %tag, "Tagged new version");
        Ok(())
    }

    fn push_new_version(&self, target: &PushTarget) -> Result<()> {
        let mut refspecs = vec![format!(
            "refs/heads/{branch}:refs/heads/{branch}",
            branch = target.branch
        )];
        for tag in self.git.tag_names()? {
            if self.config.parse_tag(&tag).is_some() {
                refspecs.push(format!("refs/tags/{tag}:refs/tags/{tag}"));
            }
        }

        self.git
            .push(&target.url(), &refspecs, target.credentials.as_ref())
            .with_context(|| format!("Failed to push to {}", target.url()))
    }

    fn current_head_hash(&self) -> Result<String> {
        self.git.head_hash()
    }

    fn repository_owner_and_name(&self) -> Result<(String, String)> {
        self.git.owner_and_name()
    }
}
