//! GitHub REST v3 client.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use super::http::HttpClient;
use super::{Hvcs, HvcsError};
use crate::artifacts::dist_files;
use crate::git::Credentials;

const DEFAULT_DOMAIN: &str = "github.com";

#[derive(Deserialize)]
struct CombinedStatus {
    state: String,
}

#[derive(Deserialize)]
struct Release {
    id: u64,
}

#[derive(Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
}

#[derive(Serialize)]
struct UpdateRelease<'a> {
    body: &'a str,
}

/// GitHub or GitHub Enterprise client.
pub struct Github {
    http: HttpClient,
    domain: String,
    api_url: String,
    uploads_url: String,
    token: Option<String>,
}

impl Github {
    /// Creates a client for `domain` (default `github.com`).
    pub fn new(domain: Option<&str>, token: Option<String>) -> Result<Self> {
        let domain = domain.unwrap_or(DEFAULT_DOMAIN).to_string();
        let (api_url, uploads_url) = if domain == DEFAULT_DOMAIN {
            (
                "https://api.github.com".to_string(),
                "https://uploads.github.com".to_string(),
            )
        } else {
            (
                format!("https://{domain}/api/v3"),
                format!("https://{domain}/api/uploads"),
            )
        };
        Self::with_urls(domain, api_url, uploads_url, token)
    }

    /// Creates a client against explicit API and upload endpoints.
    pub fn with_urls(
        domain: String,
        api_url: String,
        uploads_url: String,
        token: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new()?,
            domain,
            api_url: api_url.trim_end_matches('/').to_string(),
            uploads_url: uploads_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => builder.header("Authorization", format!("token {token}")),
            None => builder,
        }
    }

    fn require_token(&self) -> Result<(), HvcsError> {
        match self.token {
            Some(_) => Ok(()),
            None => Err(HvcsError::MissingToken("GitHub")),
        }
    }

    /// Id of the release for `tag`, if one exists.
    fn release_id(&self, owner: &str, repo: &str, tag: &str) -> Result<Option<u64>, HvcsError> {
        let url = format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.api_url);
        let response = self.http.send(self.request(Method::GET, &url))?;
        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let release: Release = response.ensure_success()?.json()?;
        Ok(Some(release.id))
    }
}

impl Hvcs for Github {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    fn domain(&self) -> &str {
        &self.domain
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
        let url = format!("{}/repos/{owner}/{repo}/commits/{sha}/status", self.api_url);
        let status: CombinedStatus = self
            .http
            .send(self.request(Method::GET, &url))?
            .ensure_success()?
            .json()?;
        debug!(state = %status.state, sha, "GitHub combined status");
        Ok(status.state == "success")
    }

    fn post_changelog(&self, owner: &str, repo: &str, tag: &str, markdown: &str) -> Result<()> {
        self.require_token()?;

        match self.release_id(owner, repo, tag)? {
            Some(id) => {
                let url = format!("{}/repos/{owner}/{repo}/releases/{id}", self.api_url);
                self.http
                    .send(
                        self.request(Method::PATCH, &url)
                            .json(&UpdateRelease { body: markdown }),
                    )?
                    .ensure_success()?;
                info!(tag, "Updated GitHub release notes");
            }
            None => {
                let url = format!("{}/repos/{owner}/{repo}/releases", self.api_url);
                self.http
                    .send(self.request(Method::POST, &url).json(&CreateRelease {
                        tag_name: tag,
                        name: tag,
                        body: markdown,
                        draft: false,
                        prerelease: false,
                    }))?
                    .ensure_success()?;
                info!(tag, "Created GitHub release");
            }
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
        self.require_token()?;

        let id = self
            .release_id(owner, repo, tag)?
            .ok_or_else(|| HvcsError::ReleaseNotFound(tag.to_string()))?;

        for file in dist_files(dist_path)? {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Invalid asset file name: {}", file.display()))?;
            let content =
                std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
            let url = format!(
                "{}/repos/{owner}/{repo}/releases/{id}/assets?name={encoded}",
                self.uploads_url
            );

            let response = self.http.send(
                self.request(Method::POST, &url)
                    .header("Content-Type", "application/octet-stream")
                    .body(content),
            )?;

            // 422 means an asset with this name is already attached.
            if response.status == StatusCode::UNPROCESSABLE_ENTITY
                && response.body.contains("already_exists")
            {
                warn!(asset = name, "Release asset already exists, skipping");
                continue;
            }
            response.ensure_success()?;
            info!(asset = name, tag, "Uploaded release asset");
        }
        Ok(())
    }
}
