// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors shared by every upstream client (identity provider and completion API).

use reqwest::StatusCode;

/// HTTP status the completion API uses when it is temporarily overloaded.
pub const STATUS_OVERLOADED: u16 = 529;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network failure, non-success status, or an empty/unusable body.
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// HTTP 401 from any upstream. Never retried.
    #[error("upstream rejected credentials: {0}")]
    Authentication(String),

    /// HTTP 429.
    #[error("upstream rate limit exceeded: {0}")]
    RateLimited(String),

    /// HTTP 529.
    #[error("upstream overloaded: {0}")]
    Overloaded(String),

    /// Key decode or cipher initialization failure. Never retried.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Model output could not be read as the expected JSON array.
    #[error("could not extract structured output: {0}")]
    Extraction(String),

    #[error("configuration missing: {0}")]
    MissingConfig(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Classify a non-success HTTP status returned by `context`.
    pub fn from_status(status: StatusCode, context: &str, body: &str) -> Self {
        let detail = format!("{context} returned {status}: {body}");
        match status.as_u16() {
            401 => ProviderError::Authentication(detail),
            429 => ProviderError::RateLimited(detail),
            STATUS_OVERLOADED => ProviderError::Overloaded(detail),
            _ => ProviderError::Transport(detail),
        }
    }

    /// Whether another attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport(_)
                | ProviderError::RateLimited(_)
                | ProviderError::Overloaded(_)
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ProviderError::from_status(status, "request", &e.to_string()),
            None => ProviderError::Transport(e.to_string()),
        }
    }
}

/// Result type for upstream operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
