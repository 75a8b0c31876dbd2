// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP plumbing shared by the simple-auth provider clients.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::error::{ProviderError, ProviderResult};
use crate::config::ProviderConfig;

/// Connect/read timeout applied to every upstream client.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the HTTP client used for all upstream calls.
pub fn build_http_client() -> ProviderResult<Client> {
    Client::builder()
        .connect_timeout(UPSTREAM_TIMEOUT)
        .read_timeout(UPSTREAM_TIMEOUT)
        .timeout(UPSTREAM_TIMEOUT * 2)
        .build()
        .map_err(|e| ProviderError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Authenticated access to the provider host.
///
/// Holds the static API key; the per-request wrapped AES key is passed to
/// each call because it must never outlive one request.
#[derive(Debug, Clone)]
pub struct ProviderTransport {
    base_url: String,
    api_key: String,
    http: Client,
}

impl ProviderTransport {
    pub fn new(config: &ProviderConfig, http: Client) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` with query parameters and parse the JSON body.
    pub async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> ProviderResult<Value> {
        let url = url::Url::parse_with_params(&self.url(path), query)
            .map_err(|e| ProviderError::Transport(format!("invalid provider URL: {e}")))?;

        let response = self
            .http
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("GET {path} failed: {e}")))?;

        read_json(response, &format!("GET {path}")).await
    }

    /// POST a JSON body with the `API-KEY` and `ENC-KEY` headers.
    pub async fn post_encrypted(
        &self,
        path: &str,
        wrapped_key: &str,
        body: &Value,
    ) -> ProviderResult<Value> {
        debug!(path, "Provider request");

        let response = self
            .http
            .post(self.url(path))
            .header("API-KEY", &self.api_key)
            .header("ENC-KEY", wrapped_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("POST {path} failed: {e}")))?;

        read_json(response, &format!("POST {path}")).await
    }
}

/// Check the status and parse a JSON body, treating an empty body as a failure.
pub(crate) async fn read_json(response: reqwest::Response, context: &str) -> ProviderResult<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Transport(format!("{context} body read failed: {e}")))?;

    if !status.is_success() {
        return Err(ProviderError::from_status(status, context, &body));
    }

    if body.trim().is_empty() {
        return Err(ProviderError::Transport(format!("{context} returned an empty body")));
    }

    serde_json::from_str(&body)
        .map_err(|e| ProviderError::Transport(format!("{context} invalid JSON: {e}")))
}
