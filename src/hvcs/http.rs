//! Blocking facade over the async HTTP client.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::HvcsError;

/// HTTP request timeout for hosting-service calls.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Response status and body.
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    /// Deserialises the body of a successful response.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HvcsError> {
        serde_json::from_str(&self.body).map_err(|e| HvcsError::InvalidResponse(e.to_string()))
    }

    /// Fails unless the status is 2xx.
    pub fn ensure_success(self) -> Result<Self, HvcsError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(HvcsError::Api {
                status: self.status.as_u16(),
                body: self.body,
            })
        }
    }
}

/// Runs requests to completion on a private current-thread runtime.
pub(crate) struct HttpClient {
    runtime: tokio::runtime::Runtime,
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("semrel/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { runtime, client })
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    pub fn send(&self, request: RequestBuilder) -> Result<HttpResponse, HvcsError> {
        self.runtime.block_on(async move {
            let response = request
                .send()
                .await
                .map_err(|e| HvcsError::Network(e.to_string()))?;
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|e| {
                debug!("Failed to read response body: {e}");
                String::new()
            });
            debug!(status = status.as_u16(), body_len = body.len(), "Received response");
            Ok(HttpResponse { status, body })
        })
    }
}
