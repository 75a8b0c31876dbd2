// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Provider RSA public key lookup.
//!
//! The key rotates on the provider side, so it is fetched for every request
//! and never cached.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::{ProviderError, ProviderResult};
use super::transport::ProviderTransport;

pub const PUBLIC_KEY_PATH: &str = "/api/Auth/GetPublicKey";

#[derive(Debug, Clone)]
pub struct KeyExchangeClient {
    transport: ProviderTransport,
}

impl KeyExchangeClient {
    pub fn new(transport: ProviderTransport) -> Self {
        Self { transport }
    }

    /// Fetch the provider's current public key (Base64 SPKI DER).
    pub async fn fetch_public_key(&self) -> ProviderResult<String> {
        let response = self
            .transport
            .get_json(PUBLIC_KEY_PATH, &[("APIkey", self.transport.api_key())])
            .await?;

        let key = response
            .get("PublicKey")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ProviderError::Transport("missing PublicKey in key exchange response".to_string())
            })?;

        debug!(fingerprint = %key_fingerprint(key), "Fetched provider public key");
        Ok(key.to_string())
    }
}

/// Short SHA-256 fingerprint for logging a key without logging the key.
pub fn key_fingerprint(key: &str) -> String {
    Sha256::digest(key.as_bytes())
        .iter()
        .take(8)
        .map(|b| format!("{b:02x}"))
        .collect()
}
