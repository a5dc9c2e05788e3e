//! Git repository operations

use std::cell::Cell;
use std::path::Path;

use anyhow::{Context, Result};
use git2::{build::CheckoutBuilder, Oid, PushOptions, RemoteCallbacks, Repository, Signature};
use tracing::debug;

use super::remote;
use crate::history::CommitEntry;

/// Username/token pair for authenticated pushes.
#[derive(Clone)]
pub struct Credentials {
    /// Username presented alongside the token.
    pub username: String,
    /// Access token.
    pub token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"***")
            .finish()
    }
}

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Open repository at current directory
    pub fn open() -> Result<Self> {
        let repo = Repository::discover(".").context("Not in a git repository")?;

        Ok(Self { repo })
    }

    /// Open repository at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open git repository")?;

        Ok(Self { repo })
    }

    /// Get workdir path
    pub fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .context("Repository has no working directory")
    }

    /// Get access to the underlying git2::Repository
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Get current branch name
    pub fn get_current_branch(&self) -> Result<String> {
        let head = self.repo.head().context("Failed to get HEAD reference")?;

        if let Some(name) = head.shorthand() {
            if name != "HEAD" {
                return Ok(name.to_string());
            }
        }

        anyhow::bail!("Repository is in detached HEAD state")
    }

    /// Switches the working tree to a local branch.
    pub fn checkout_branch(&self, branch: &str) -> Result<()> {
        let refname = format!("refs/heads/{branch}");
        let reference = self
            .repo
            .find_reference(&refname)
            .with_context(|| format!("Branch not found: {branch}"))?;
        let object = reference
            .peel(git2::ObjectType::Commit)
            .with_context(|| format!("Failed to resolve branch: {branch}"))?;

        self.repo
            .checkout_tree(&object, Some(CheckoutBuilder::new().safe()))
            .with_context(|| format!("Failed to check out branch: {branch}"))?;
        self.repo
            .set_head(&refname)
            .with_context(|| format!("Failed to move HEAD to {branch}"))?;
        Ok(())
    }

    /// Full hash of the HEAD commit.
    pub fn head_hash(&self) -> Result<String> {
        Ok(self.head_oid()?.to_string())
    }

    /// Names of all tags.
    pub fn tag_names(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None).context("Failed to list tags")?;
        Ok(tags.iter().flatten().map(str::to_string).collect())
    }

    /// Resolves a tag to the commit it points at, if the tag exists.
    pub fn tag_target(&self, tag: &str) -> Result<Option<Oid>> {
        match self.repo.revparse_single(&format!("refs/tags/{tag}")) {
            Ok(obj) => {
                let commit = obj
                    .peel_to_commit()
                    .with_context(|| format!("Tag does not point at a commit: {tag}"))?;
                Ok(Some(commit.id()))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to resolve tag: {tag}")),
        }
    }

    /// Walks from `end` back towards `start` (exclusive), oldest first.
    ///
    /// The walk also stops at the first commit `stop_at` accepts; that commit
    /// is excluded. Merge commits are skipped.
    pub fn commits_between(
        &self,
        start: Option<Oid>,
        end: Oid,
        stop_at: impl Fn(&str) -> bool,
    ) -> Result<Vec<CommitEntry>> {
        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker.push(end).context("Failed to push end commit")?;
        if let Some(start) = start {
            walker.hide(start).context("Failed to hide start commit")?;
        }

        let mut commits = Vec::new();
        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self
                .repo
                .find_commit(oid)
                .context("Failed to find commit")?;

            let message = commit.message().unwrap_or("").to_string();
            if stop_at(&message) {
                break;
            }

            if commit.parent_count() > 1 {
                continue;
            }

            commits.push(CommitEntry::new(oid.to_string(), message));
        }

        // Reverse to get chronological order (oldest first)
        commits.reverse();
        Ok(commits)
    }

    /// Resolves `HEAD` to a commit id.
    pub fn head_oid(&self) -> Result<Oid> {
        let head = self.repo.head().context("Failed to get HEAD")?;
        Ok(head
            .peel_to_commit()
            .context("Failed to peel HEAD to commit")?
            .id())
    }

    /// Stages `paths` and commits them on HEAD.
    pub fn commit_paths(&self, paths: &[&Path], message: &str, author: &Signature) -> Result<Oid> {
        let mut index = self.repo.index().context("Failed to open index")?;
        for path in paths {
            index
                .add_path(path)
                .with_context(|| format!("Failed to stage {}", path.display()))?;
        }
        index.write().context("Failed to write index")?;

        let tree_id = index.write_tree().context("Failed to write tree")?;
        let tree = self.repo.find_tree(tree_id).context("Failed to find tree")?;
        let parent = self
            .repo
            .head()
            .context("Failed to get HEAD")?
            .peel_to_commit()
            .context("Failed to peel HEAD to commit")?;

        self.repo
            .commit(Some("HEAD"), author, author, message, &tree, &[&parent])
            .context("Failed to create commit")
    }

    /// Creates an annotated tag on HEAD.
    pub fn create_tag(&self, name: &str, tagger: &Signature) -> Result<Oid> {
        let head = self
            .repo
            .head()
            .context("Failed to get HEAD")?
            .peel(git2::ObjectType::Commit)
            .context("Failed to peel HEAD to commit")?;
        self.repo
            .tag(name, &head, tagger, name, false)
            .with_context(|| format!("Failed to create tag {name}"))
    }

    /// Pushes `refspecs` to `url`, authenticating with `credentials` when given.
    pub fn push(&self, url: &str, refspecs: &[String], credentials: Option<&Credentials>) -> Result<()> {
        let mut remote = self
            .repo
            .remote_anonymous(url)
            .context("Failed to create push remote")?;

        let mut rejected: Vec<String> = Vec::new();
        {
            let mut callbacks = RemoteCallbacks::new();
            if let Some(credentials) = credentials {
                let attempts = Cell::new(0);
                callbacks.credentials(move |_url, _username, _allowed| {
                    // libgit2 keeps asking while the server rejects the token.
                    attempts.set(attempts.get() + 1);
                    if attempts.get() > 1 {
                        return Err(git2::Error::from_str("authentication rejected by remote"));
                    }
                    git2::Cred::userpass_plaintext(&credentials.username, &credentials.token)
                });
            }
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejected.push(format!("{refname}: {message}"));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            debug!(refspecs = ?refspecs, "Pushing to remote");
            remote
                .push(refspecs, Some(&mut options))
                .context("Failed to push to remote")?;
        }

        if !rejected.is_empty() {
            anyhow::bail!("Remote rejected: {}", rejected.join(", "));
        }
        Ok(())
    }

    /// Returns `(owner, name)` parsed from the origin remote.
    pub fn owner_and_name(&self) -> Result<(String, String)> {
        let uri = remote::origin_url(&self.repo)?;
        remote::parse_owner_and_name(&uri)
    }
}
