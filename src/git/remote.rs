//! Git remote operations

use anyhow::{Context, Result};
use git2::Repository;
use url::Url;

/// Returns the URL of the `origin` remote.
pub fn origin_url(repo: &Repository) -> Result<String> {
    let remote = repo
        .find_remote("origin")
        .context("Repository has no 'origin' remote")?;
    remote
        .url()
        .map(str::to_string)
        .context("Remote 'origin' has no valid URL")
}

/// Extracts `(owner, name)` from a remote URI.
///
/// Handles HTTPS, `ssh://` and scp-like (`git@host:owner/name.git`) forms.
/// Nested groups are kept in the owner, as GitLab allows them.
pub fn parse_owner_and_name(uri: &str) -> Result<(String, String)> {
    let path = if let Ok(url) = Url::parse(uri) {
        url.path().to_string()
    } else if let Some((_, path)) = uri.split_once(':') {
        // scp-like: git@github.com:owner/repo.git
        path.to_string()
    } else {
        anyhow::bail!("Unrecognised remote URI: {}", uri);
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    match path.rsplit_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => anyhow::bail!("Invalid repository path in remote URI: {}", uri),
    }
}
