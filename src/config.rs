// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup into an
//! immutable [`AppConfig`] and shared through `AppState`. Secrets are never
//! compiled in.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PROVIDER_BASE_URL` | Simple-auth provider host | `https://dev.tilko.net` |
//! | `PROVIDER_API_KEY` | Provider API key (`API-KEY` header / `APIkey` query) | Required |
//! | `COMPLETION_API_URL` | Completion (messages) endpoint | `https://api.anthropic.com/v1/messages` |
//! | `COMPLETION_API_KEY` | Completion API key | Optional (analysis returns `ERROR` without it) |
//! | `COMPLETION_MODEL` | Model name | `claude-3-5-sonnet-20241022` |
//! | `COMPLETION_MAX_TOKENS` | Max tokens per completion | `1000` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use crate::providers::error::{ProviderError, ProviderResult};

pub const PROVIDER_BASE_URL_ENV: &str = "PROVIDER_BASE_URL";
pub const PROVIDER_API_KEY_ENV: &str = "PROVIDER_API_KEY";
pub const COMPLETION_API_URL_ENV: &str = "COMPLETION_API_URL";
pub const COMPLETION_API_KEY_ENV: &str = "COMPLETION_API_KEY";
pub const COMPLETION_MODEL_ENV: &str = "COMPLETION_MODEL";
pub const COMPLETION_MAX_TOKENS_ENV: &str = "COMPLETION_MAX_TOKENS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_PROVIDER_BASE_URL: &str = "https://dev.tilko.net";
const DEFAULT_COMPLETION_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_COMPLETION_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_COMPLETION_MAX_TOKENS: u32 = 1000;
const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Identity/health-data provider settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Completion endpoint settings.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub anthropic_version: String,
}

/// Process-wide configuration. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub completion: CompletionConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> ProviderResult<Self> {
        let provider = ProviderConfig {
            base_url: env_or_default(PROVIDER_BASE_URL_ENV, DEFAULT_PROVIDER_BASE_URL),
            api_key: env_required(PROVIDER_API_KEY_ENV)?,
        };

        let max_tokens = match env_optional(COMPLETION_MAX_TOKENS_ENV) {
            Some(raw) => raw.parse().map_err(|_| {
                ProviderError::MissingConfig(format!(
                    "{COMPLETION_MAX_TOKENS_ENV} must be a positive integer, got {raw:?}"
                ))
            })?,
            None => DEFAULT_COMPLETION_MAX_TOKENS,
        };

        let completion = CompletionConfig {
            api_url: env_or_default(COMPLETION_API_URL_ENV, DEFAULT_COMPLETION_API_URL),
            api_key: env_optional(COMPLETION_API_KEY_ENV),
            model: env_or_default(COMPLETION_MODEL_ENV, DEFAULT_COMPLETION_MODEL),
            max_tokens,
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
        };

        let port = env_optional(PORT_ENV)
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            provider,
            completion,
            host: env_or_default(HOST_ENV, DEFAULT_HOST),
            port,
        })
    }
}

impl CompletionConfig {
    /// Settings pointing at `api_url` with defaults for everything else.
    pub fn with_url(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            max_tokens: DEFAULT_COMPLETION_MAX_TOKENS,
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
        }
    }
}

fn env_required(name: &str) -> ProviderResult<String> {
    env_optional(name).ok_or_else(|| ProviderError::MissingConfig(name.to_string()))
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_defaults_match_api_contract() {
        let config = CompletionConfig::with_url("http://localhost/v1/messages", None);
        assert_eq!(config.anthropic_version, "2023-06-01");
        assert_eq!(config.max_tokens, 1000);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn env_optional_treats_blank_as_missing() {
        assert_eq!(env_optional("HEALTH_INSIGHT_TEST_SURELY_UNSET"), None);
        assert_eq!(
            env_or_default("HEALTH_INSIGHT_TEST_SURELY_UNSET", "fallback"),
            "fallback"
        );
        assert!(matches!(
            env_required("HEALTH_INSIGHT_TEST_SURELY_UNSET"),
            Err(ProviderError::MissingConfig(name)) if name == "HEALTH_INSIGHT_TEST_SURELY_UNSET"
        ));
    }
}
