//! Hosting service (GitHub, GitLab) integration.

pub mod github;
pub mod gitlab;
mod http;
#[cfg(test)]
mod test_utils;

pub use github::Github;
pub use gitlab::Gitlab;

use std::path::Path;

use anyhow::Result;
use thiserror::Error;

use crate::config::{HvcsKind, ReleaseConfig};
use crate::git::Credentials;
use crate::utils::Secrets;

/// Hosting service errors.
#[derive(Error, Debug)]
pub enum HvcsError {
    /// The operation needs a token and none is configured.
    #[error("Missing token for {0}")]
    MissingToken(&'static str),

    /// The request could not be sent.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("API request failed with HTTP {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response body was not what the API documents.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// No release exists for the tag.
    #[error("No release found for tag {0}")]
    ReleaseNotFound(String),
}

/// Operations on the hosting service.
pub trait Hvcs {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Hosting domain used for pushes, e.g. `github.com`.
    fn domain(&self) -> &str;

    /// Access token, if configured.
    fn token(&self) -> Option<&str>;

    /// Whether a token is configured.
    fn check_token(&self) -> bool {
        self.token().is_some()
    }

    /// Credentials to push over HTTPS with the token.
    fn credentials(&self) -> Option<Credentials>;

    /// Whether CI reports success for `sha`. Errors mean the status is unknown.
    fn check_build_status(&self, owner: &str, repo: &str, sha: &str) -> Result<bool>;

    /// Creates or updates the release notes of `tag`.
    fn post_changelog(&self, owner: &str, repo: &str, tag: &str, markdown: &str) -> Result<()>;

    /// Uploads every file in `dist_path` as an asset of the `tag` release.
    fn upload_to_release(&self, owner: &str, repo: &str, tag: &str, dist_path: &Path)
        -> Result<()>;
}

/// Builds the configured hosting client.
pub fn hvcs_for(config: &ReleaseConfig, secrets: &Secrets) -> Result<Box<dyn Hvcs>> {
    let domain = config.hvcs_domain.as_deref();
    Ok(match config.hvcs {
        HvcsKind::Github => Box::new(Github::new(domain, secrets.gh_token.clone())?),
        HvcsKind::Gitlab => Box::new(Gitlab::new(domain, secrets.gl_token.clone())?),
    })
}
