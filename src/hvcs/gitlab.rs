//! GitLab REST v4 client.

use std::path::Path;

use anyhow::Result;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use super::http::HttpClient;
use super::{Hvcs, HvcsError};
use crate::git::Credentials;

const DEFAULT_DOMAIN: &str = "gitlab.com";

#[derive(Deserialize)]
struct CommitStatus {
    status: String,
    #[serde(default)]
    allow_failure: bool,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct UpdateRelease<'a> {
    description: &'a str,
}

/// GitLab.com or self-managed GitLab client.
pub struct Gitlab {
    http: HttpClient,
    domain: String,
    api_url: String,
    token: Option<String>,
}

impl Gitlab {
    /// Creates a client for `domain` (default `gitlab.com`).
    pub fn new(domain: Option<&str>, token: Option<String>) -> Result<Self> {
        let domain = domain.unwrap_or(DEFAULT_DOMAIN).to_string();
        let api_url = format!("https://{domain}/api/v4");
        Self::with_url(domain, api_url, token)
    }

    /// Creates a client against an explicit API endpoint.
    pub fn with_url(domain: String, api_url: String, token: Option<String>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new()?,
            domain,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.header("PRIVATE-TOKEN", token),
            None => builder,
        }
    }

    fn project_url(&self, owner: &str, repo: &str) -> String {
        let id: String = form_urlencoded::byte_serialize(format!("{owner}/{repo}").as_bytes())
            .collect();
        format!("{}/projects/{id}", self.api_url)
    }
}

/// A pipeline passes when every job succeeded, was skipped, or was allowed to fail.
fn statuses_pass(statuses: &[CommitStatus]) -> bool {
    statuses.iter().all(|job| match job.status.as_str() {
        "success" | "skipped" => true,
        "failed" if job.allow_failure => true,
        other => {
            debug!(
                job = job.name.as_deref().unwrap_or("<unnamed>"),
                status = other,
                "GitLab job is not passing"
            );
            false
        }
    })
}

impl Hvcs for Gitlab {
    fn name(&self) -> &'static str {
        "GitLab"
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn credentials(&self) -> Option<Credentials> {
        self.token.as_ref().map(|token| Credentials {
            username: "gitlab-ci-token".to_string(),
            token: token.clone(),
        })
    }

    fn check_build_status(&self, owner: &str, repo: &str, sha: &str) -> Result<bool> {
        let url = format!(
            "{}/repository/commits/{sha}/statuses",
            self.project_url(owner, repo)
        );
        let statuses: Vec<CommitStatus> = self
            .http
            .send(self.request(Method::GET, &url))?
            .ensure_success()?
            .json()?;
        Ok(statuses_pass(&statuses))
    }

    fn post_changelog(&self, owner: &str, repo: &str, tag: &str, markdown: &str) -> Result<()> {
        if self.token.is_none() {
            return Err(HvcsError::MissingToken("GitLab").into());
        }

        let releases = format!("{}/releases", self.project_url(owner, repo));
        let response = self.http.send(self.request(Method::POST, &releases).json(
            &CreateRelease {
                tag_name: tag,
                name: tag,
                description: markdown,
            },
        ))?;

        // 409 means the release exists; replace its notes instead.
        if response.status == StatusCode::CONFLICT {
            let encoded: String = form_urlencoded::byte_serialize(tag.as_bytes()).collect();
            let url = format!("{releases}/{encoded}");
            self.http
                .send(
                    self.request(Method::PUT, &url)
                        .json(&UpdateRelease {
                            description: markdown,
                        }),
                )?
                .ensure_success()?;
            info!(tag, "Updated GitLab release notes");
            return Ok(());
        }

        response.ensure_success()?;
        info!(tag, "Created GitLab release");
        Ok(())
    }

    fn upload_to_release(
        &self,
        _owner: &str,
        _repo: &str,
        tag: &str,
        dist_path: &Path,
    ) -> Result<()> {
        warn!(
            tag,
            dist_path = %dist_path.display(),
            "Release asset upload is not supported on GitLab, skipping"
        );
        Ok(())
    }
}
