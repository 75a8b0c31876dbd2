// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NHIS simple-auth handshake.
//!
//! ## Flow
//!
//! 1. Fetch the provider's current RSA public key
//! 2. Generate a fresh [`EncryptionContext`] and wrap its AES key
//! 3. Encrypt name, birth date and phone number individually
//! 4. POST them with the `PrivateAuthType` discriminator, `API-KEY` and `ENC-KEY`
//!    (the method's code; with no method given the wire value is `"0"`)
//! 5. Read `ResultData` into an [`AuthSession`]
//!
//! The handshake is single-pass: any failure is returned to the caller
//! immediately, without retries.
//!
//! ## `ENC:` marker
//!
//! The PII fields in `ResultData` are ciphertext produced by the provider.
//! They are stored tagged with `ENC:` and never decrypted locally; the record
//! clients strip the tag and re-encrypt the value under their own fresh key.
//! Whether the provider expects its own ciphertext echoed back this way, or
//! whether a decryption step is missing, has not been confirmed with the
//! provider. The observed behaviour is preserved as-is.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::error::{ProviderError, ProviderResult};
use super::key_exchange::KeyExchangeClient;
use super::transport::ProviderTransport;
use crate::crypto::EncryptionContext;

pub const SIMPLE_AUTH_PATH: &str = "/api/v1.0/nhissimpleauth/simpleauthrequest";

/// Tag marking a value as provider ciphertext not yet processed by us.
pub const ENC_MARKER: &str = "ENC:";

/// Identity app the user confirms the simple-auth request with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Kakao,
    #[serde(rename = "payko", alias = "payco")]
    Payco,
    Kukmin,
    Samsung,
    Pass,
    Shinhan,
    Naver,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported auth method: {0}")]
pub struct UnknownAuthMethod(pub String);

impl AuthMethod {
    pub const ALL: [AuthMethod; 7] = [
        AuthMethod::Kakao,
        AuthMethod::Payco,
        AuthMethod::Kukmin,
        AuthMethod::Samsung,
        AuthMethod::Pass,
        AuthMethod::Shinhan,
        AuthMethod::Naver,
    ];

    pub fn method(&self) -> &'static str {
        match self {
            AuthMethod::Kakao => "kakao",
            AuthMethod::Payco => "payko",
            AuthMethod::Kukmin => "kukmin",
            AuthMethod::Samsung => "samsung",
            AuthMethod::Pass => "pass",
            AuthMethod::Shinhan => "shinhan",
            AuthMethod::Naver => "naver",
        }
    }

    /// Provider `PrivateAuthType` code.
    pub fn private_auth_type(&self) -> &'static str {
        match self {
            AuthMethod::Kakao => "0",
            AuthMethod::Payco => "1",
            AuthMethod::Kukmin => "2",
            AuthMethod::Samsung => "3",
            AuthMethod::Pass => "4",
            AuthMethod::Shinhan => "5",
            AuthMethod::Naver => "6",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AuthMethod::Kakao => "카카오",
            AuthMethod::Payco => "페이코",
            AuthMethod::Kukmin => "국민은행",
            AuthMethod::Samsung => "삼성패스",
            AuthMethod::Pass => "디지털원패스",
            AuthMethod::Shinhan => "신한",
            AuthMethod::Naver => "네이버",
        }
    }

    /// Case-insensitive lookup by method name.
    pub fn from_method(method: &str) -> Result<Self, UnknownAuthMethod> {
        let trimmed = method.trim();
        if trimmed.eq_ignore_ascii_case("payco") {
            return Ok(AuthMethod::Payco);
        }
        Self::ALL
            .into_iter()
            .find(|m| m.method().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownAuthMethod(trimmed.to_string()))
    }

    /// Like [`AuthMethod::from_method`], falling back to the default method.
    pub fn from_method_lenient(method: Option<&str>) -> Self {
        match method.map(Self::from_method) {
            Some(Ok(m)) => m,
            Some(Err(e)) => {
                warn!(error = %e, "Falling back to default auth method");
                Self::default()
            }
            None => Self::default(),
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method())
    }
}

/// Caller input for the handshake. PII is plaintext here and only here.
#[derive(Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub user_name: String,
    pub birth_date: String,
    pub user_cellphone_number: String,
    #[serde(default)]
    pub auth_method: Option<String>,
}

impl AuthRequest {
    pub fn method(&self) -> AuthMethod {
        AuthMethod::from_method_lenient(self.auth_method.as_deref())
    }
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("user_name", &"<redacted>")
            .field("birth_date", &"<redacted>")
            .field("user_cellphone_number", &"<redacted>")
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

/// Authenticated provider session.
///
/// Immutable: fields are only readable. The three PII fields carry the
/// [`ENC_MARKER`] tag whenever they are present.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    cx_id: Option<String>,
    private_auth_type: Option<String>,
    req_tx_id: Option<String>,
    token: Option<String>,
    tx_id: Option<String>,
    user_name: Option<String>,
    birth_date: Option<String>,
    user_cellphone_number: Option<String>,
    #[serde(default)]
    auth_method: AuthMethod,
}

impl AuthSession {
    /// Build a session from the handshake response's `ResultData`.
    pub fn from_handshake_response(response: &Value, method: AuthMethod) -> ProviderResult<Self> {
        let data = response
            .get("ResultData")
            .filter(|d| d.is_object())
            .ok_or_else(|| {
                let message = response
                    .get("Message")
                    .and_then(Value::as_str)
                    .unwrap_or("no message");
                ProviderError::Transport(format!(
                    "handshake response has no ResultData: {message}"
                ))
            })?;

        let text = |field: &str| data.get(field).and_then(Value::as_str).map(str::to_string);
        let tagged = |field: &str| text(field).map(|v| format!("{ENC_MARKER}{v}"));

        Ok(Self {
            cx_id: text("CxId"),
            private_auth_type: text("PrivateAuthType"),
            req_tx_id: text("ReqTxId"),
            token: text("Token"),
            tx_id: text("TxId"),
            user_name: tagged("UserName"),
            birth_date: tagged("BirthDate"),
            user_cellphone_number: tagged("UserCellphoneNumber"),
            auth_method: method,
        })
    }

    pub fn cx_id(&self) -> Option<&str> {
        self.cx_id.as_deref()
    }

    pub fn private_auth_type(&self) -> Option<&str> {
        self.private_auth_type.as_deref()
    }

    pub fn req_tx_id(&self) -> Option<&str> {
        self.req_tx_id.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn tx_id(&self) -> Option<&str> {
        self.tx_id.as_deref()
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    /// Tagged provider ciphertext as stored.
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn birth_date(&self) -> Option<&str> {
        self.birth_date.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.user_cellphone_number.as_deref()
    }

    /// Session identifiers sent in clear on every follow-up call.
    pub fn identifiers(&self) -> Value {
        json!({
            "CxId": self.cx_id,
            "PrivateAuthType": self.private_auth_type,
            "ReqTxId": self.req_tx_id,
            "Token": self.token,
            "TxId": self.tx_id,
        })
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("cx_id", &self.cx_id)
            .field("req_tx_id", &self.req_tx_id)
            .field("tx_id", &self.tx_id)
            .field("auth_method", &self.auth_method)
            .finish_non_exhaustive()
    }
}

/// Remove the [`ENC_MARKER`] tag; absent values become empty.
pub fn strip_marker(value: Option<&str>) -> &str {
    let value = value.unwrap_or_default();
    value.strip_prefix(ENC_MARKER).unwrap_or(value)
}

#[derive(Debug, Clone)]
pub struct AuthHandshakeClient {
    transport: ProviderTransport,
    key_exchange: KeyExchangeClient,
}

impl AuthHandshakeClient {
    pub fn new(transport: ProviderTransport) -> Self {
        Self {
            key_exchange: KeyExchangeClient::new(transport.clone()),
            transport,
        }
    }

    /// Run the handshake and return the authenticated session.
    pub async fn request(&self, request: &AuthRequest) -> ProviderResult<AuthSession> {
        let method = request.method();
        let response = self.request_raw(request).await?;
        let session = AuthSession::from_handshake_response(&response, method)?;

        info!(
            auth_method = %method,
            tx_id = ?session.tx_id(),
            "Simple-auth handshake accepted"
        );
        Ok(session)
    }

    /// Run the handshake and return the provider's response untouched.
    pub async fn request_raw(&self, request: &AuthRequest) -> ProviderResult<Value> {
        let method = request.method();

        let public_key = self.key_exchange.fetch_public_key().await?;
        let context = EncryptionContext::new(&public_key)?;

        let body = json!({
            "PrivateAuthType": method.private_auth_type(),
            "UserName": context.encrypt(&request.user_name)?,
            "BirthDate": context.encrypt(&request.birth_date)?,
            "UserCellphoneNumber": context.encrypt(&request.user_cellphone_number)?,
        });

        info!(auth_method = %method, "Sending simple-auth handshake");
        self.transport
            .post_encrypted(SIMPLE_AUTH_PATH, context.wrapped_key(), &body)
            .await
    }
}
