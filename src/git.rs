//! Git operations and repository management.

pub mod release_repository;
pub mod remote;
pub mod repository;
pub mod version_file;

pub use release_repository::ReleaseRepository;
pub use repository::{Credentials, GitRepository};
pub use version_file::VersionVariable;

use anyhow::Result;
use semver::Version;

use crate::history::CommitEntry;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;

/// Where and how to push a release.
#[derive(Debug, Clone)]
pub struct PushTarget {
    /// Credentials for the hosting service, if a token is available.
    pub credentials: Option<Credentials>,
    /// Repository owner (or group path).
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Branch to push.
    pub branch: String,
    /// Hosting domain, e.g. `github.com`.
    pub domain: String,
}

impl PushTarget {
    /// HTTPS URL of the remote repository.
    pub fn url(&self) -> String {
        format!("https://{}/{}/{}.git", self.domain, self.owner, self.name)
    }
}

/// Version control operations a release needs.
pub trait Vcs {
    /// Checks out the release branch.
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Reads the current version from the configured version source.
    fn current_version(&self) -> Result<Version>;

    /// Highest released version strictly lower than `version`.
    fn previous_version(&self, version: &Version) -> Result<Option<Version>>;

    /// Commits after release `from` up to release `to` (or HEAD), oldest first.
    ///
    /// `from = None` means the whole history.
    fn commits_between(&self, from: Option<&Version>, to: Option<&Version>)
        -> Result<Vec<CommitEntry>>;

    /// Writes `version` into the tracked version source.
    fn set_new_version(&self, version: &Version) -> Result<()>;

    /// Commits the version change.
    fn commit_new_version(&self, version: &Version) -> Result<()>;

    /// Tags HEAD as `version`.
    fn tag_new_version(&self, version: &Version) -> Result<()>;

    /// Pushes the release branch and tags.
    fn push_new_version(&self, target: &PushTarget) -> Result<()>;

    /// Full hash of HEAD.
    fn current_head_hash(&self) -> Result<String>;

    /// `(owner, name)` of the origin repository.
    fn repository_owner_and_name(&self) -> Result<(String, String)>;
}
