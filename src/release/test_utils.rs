//! Shared test utilities for the `release` module.
//!
//! Every fake appends to one [`CallLog`] so tests can assert both which
//! side effects happened and in what order.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use semver::Version;

use crate::artifacts::{Distributions, PackageUploader, UploadError};
use crate::config::ReleaseConfig;
use crate::git::{Credentials, PushTarget, Vcs};
use crate::history::{parser_for, CommitEntry};
use crate::hvcs::Hvcs;
use crate::release::{Collaborators, Orchestrator};
use crate::utils::Secrets;

/// Shared, ordered record of calls made on the fakes.
#[derive(Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    /// All recorded calls.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Whether `operation` was called.
    pub(crate) fn called(&self, operation: &str) -> bool {
        self.calls().iter().any(|c| operation_of(c) == operation)
    }

    /// Calls that mutate the repository or a remote.
    pub(crate) fn mutations(&self) -> Vec<String> {
        const MUTATING: [&str; 10] = [
            "checkout",
            "set_new_version",
            "commit",
            "tag",
            "push",
            "remove_dists",
            "build_dists",
            "upload",
            "post_changelog",
            "upload_to_release",
        ];
        self.calls()
            .into_iter()
            .filter(|c| MUTATING.contains(&operation_of(c)))
            .collect()
    }
}

fn operation_of(call: &str) -> &str {
    call.split_whitespace().next().unwrap_or_default()
}

/// In-memory repository with a fixed version history.
pub(crate) struct FakeVcs {
    pub current: Option<Version>,
    pub tags: Vec<Version>,
    pub commits: Vec<CommitEntry>,
    /// Makes tag and commit history lookups fail.
    pub broken_history: bool,
    log: CallLog,
}

impl FakeVcs {
    pub(crate) fn new(log: &CallLog, current: &str, tags: &[&str], commits: &[&str]) -> Self {
        Self {
            current: Some(Version::parse(current).unwrap()),
            tags: tags.iter().map(|t| Version::parse(t).unwrap()).collect(),
            commits: commits
                .iter()
                .enumerate()
                .map(|(i, message)| CommitEntry::new(format!("{i:040x}"), *message))
                .collect(),
            broken_history: false,
            log: log.clone(),
        }
    }

    /// The current version cannot be read.
    pub(crate) fn unreadable(mut self) -> Self {
        self.current = None;
        self
    }

    /// Tags and commits cannot be read.
    pub(crate) fn broken_history(mut self) -> Self {
        self.broken_history = true;
        self
    }
}

impl Vcs for FakeVcs {
    fn checkout(&self, branch: &str) -> Result<()> {
        self.log.push(format!("checkout {branch}"));
        Ok(())
    }

    fn current_version(&self) -> Result<Version> {
        self.current
            .clone()
            .ok_or_else(|| anyhow!("version_variable pattern not found"))
    }

    fn previous_version(&self, version: &Version) -> Result<Option<Version>> {
        if self.broken_history {
            return Err(anyhow!("reference 'refs/tags' not found"));
        }
        Ok(self.tags.iter().filter(|t| *t < version).max().cloned())
    }

    fn commits_between(
        &self,
        from: Option<&Version>,
        to: Option<&Version>,
    ) -> Result<Vec<CommitEntry>> {
        let show = |v: Option<&Version>| v.map_or("-".to_string(), Version::to_string);
        self.log
            .push(format!("commits_between {}..{}", show(from), show(to)));
        if self.broken_history {
            return Err(anyhow!("Failed to get HEAD: reference 'refs/heads/master' not found"));
        }
        Ok(self.commits.clone())
    }

    fn set_new_version(&self, version: &Version) -> Result<()> {
        self.log.push(format!("set_new_version {version}"));
        Ok(())
    }

    fn commit_new_version(&self, version: &Version) -> Result<()> {
        self.log.push(format!("commit {version}"));
        Ok(())
    }

    fn tag_new_version(&self, version: &Version) -> Result<()> {
        self.log.push(format!("tag {version}"));
        Ok(())
    }

    fn push_new_version(&self, target: &PushTarget) -> Result<()> {
        let auth = if target.credentials.is_some() {
            "auth"
        } else {
            "anonymous"
        };
        self.log.push(format!(
            "push {}/{}@{} {} {auth}",
            target.owner, target.name, target.branch, target.domain
        ));
        Ok(())
    }

    fn current_head_hash(&self) -> Result<String> {
        Ok("deadbeef".to_string())
    }

    fn repository_owner_and_name(&self) -> Result<(String, String)> {
        Ok(("owner".to_string(), "repo".to_string()))
    }
}

/// Hosting service with scripted answers.
pub(crate) struct FakeHvcs {
    pub token: Option<String>,
    /// `None` makes the status query fail.
    pub build_status: Option<bool>,
    pub fail_post: bool,
    pub fail_upload: bool,
    log: CallLog,
}

impl FakeHvcs {
    pub(crate) fn new(log: &CallLog, token: Option<&str>) -> Self {
        Self {
            token: token.map(str::to_string),
            build_status: Some(true),
            fail_post: false,
            fail_upload: false,
            log: log.clone(),
        }
    }
}

impl Hvcs for FakeHvcs {
    fn name(&self) -> &'static str {
        "FakeHub"
    }

    fn domain(&self) -> &str {
        "example.com"
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn credentials(&self) -> Option<Credentials> {
        self.token.as_ref().map(|token| Credentials {
            username: "x-access-token".to_string(),
            token: token.clone(),
        })
    }

    fn check_build_status(&self, owner: &str, repo: &str, sha: &str) -> Result<bool> {
        self.log
            .push(format!("check_build_status {owner}/{repo} {sha}"));
        self.build_status
            .ok_or_else(|| anyhow!("status endpoint unavailable"))
    }

    fn post_changelog(&self, owner: &str, repo: &str, tag: &str, markdown: &str) -> Result<()> {
        self.log.push(format!(
            "post_changelog {owner}/{repo} {tag} {}",
            markdown.lines().filter(|l| l.starts_with('*')).count()
        ));
        if self.fail_post {
            return Err(anyhow!("502 Bad Gateway"));
        }
        Ok(())
    }

    fn upload_to_release(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
        dist_path: &Path,
    ) -> Result<()> {
        self.log.push(format!(
            "upload_to_release {owner}/{repo} {tag} {}",
            dist_path.display()
        ));
        if self.fail_upload {
            return Err(anyhow!("asset upload rejected"));
        }
        Ok(())
    }
}

/// Records package-index uploads.
pub(crate) struct FakeUploader {
    pub fail: bool,
    log: CallLog,
}

impl FakeUploader {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self {
            fail: false,
            log: log.clone(),
        }
    }
}

impl PackageUploader for FakeUploader {
    fn upload(
        &self,
        path: &Path,
        username: Option<&str>,
        _password: Option<&str>,
        skip_existing: bool,
    ) -> Result<(), UploadError> {
        self.log.push(format!(
            "upload {} user={} skip_existing={skip_existing}",
            path.display(),
            username.unwrap_or("-")
        ));
        if self.fail {
            return Err(UploadError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "HTTPError: 403 Forbidden".to_string(),
            });
        }
        Ok(())
    }
}

/// Records distribution builds.
pub(crate) struct FakeDists {
    dist_dir: PathBuf,
    log: CallLog,
}

impl FakeDists {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self {
            dist_dir: PathBuf::from("dist"),
            log: log.clone(),
        }
    }
}

impl Distributions for FakeDists {
    fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    fn remove(&self) -> Result<()> {
        self.log.push("remove_dists");
        Ok(())
    }

    fn build(&self) -> Result<()> {
        self.log.push("build_dists");
        Ok(())
    }
}

/// Default configuration with a version variable.
pub(crate) fn test_config() -> ReleaseConfig {
    ReleaseConfig {
        version_variable: Some("pkg/__init__.py:__version__".to_string()),
        ..ReleaseConfig::default()
    }
}

/// Secrets with a package-index login and no hosting token.
pub(crate) fn test_secrets() -> Secrets {
    Secrets {
        pypi_username: Some("pypi-user".to_string()),
        pypi_password: Some("pypi-pass".to_string()),
        ..Secrets::default()
    }
}

/// Wires the fakes into an orchestrator outside any CI environment.
pub(crate) fn orchestrator<'a>(
    config: &'a ReleaseConfig,
    secrets: &'a Secrets,
    vcs: FakeVcs,
    hvcs: FakeHvcs,
    uploader: FakeUploader,
    dists: FakeDists,
) -> Orchestrator<'a> {
    Orchestrator::new(
        config,
        secrets,
        Collaborators {
            vcs: Box::new(vcs),
            hvcs: Box::new(hvcs),
            uploader: Box::new(uploader),
            dists: Box::new(dists),
            parser: parser_for(config.commit_parser),
        },
    )
    .with_ci_env(|_| None)
}
