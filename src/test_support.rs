// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process upstream mocks for client tests.

use axum::{http::HeaderMap, routing::get, Json, Router};
use base64ct::{Base64, Encoding};
use rand::rngs::OsRng;
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::crypto::{decrypt_field, PROTOCOL_IV};
use crate::providers::transport::{build_http_client, ProviderTransport};

pub const TEST_API_KEY: &str = "test-api-key";

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock listener");
    let addr = listener.local_addr().expect("mock address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{addr}")
}

/// RSA keypair plus the public half as Base64 SPKI DER, as the provider serves it.
pub fn test_keypair() -> (RsaPrivateKey, String) {
    let private = RsaPrivateKey::new(&mut OsRng, 1024).expect("generate RSA key");
    let der = private
        .to_public_key()
        .to_public_key_der()
        .expect("encode public key");
    (private, Base64::encode_string(der.as_bytes()))
}

pub fn test_transport(base_url: &str) -> ProviderTransport {
    ProviderTransport::new(
        &ProviderConfig {
            base_url: base_url.to_string(),
            api_key: TEST_API_KEY.to_string(),
        },
        build_http_client().expect("http client"),
    )
}

/// Router serving the provider's public-key endpoint for `public_b64`.
pub fn public_key_router(public_b64: String) -> Router {
    Router::new().route(
        crate::providers::key_exchange::PUBLIC_KEY_PATH,
        get(move || {
            let key = public_b64.clone();
            async move { Json(json!({ "PublicKey": key })) }
        }),
    )
}

/// Recover the per-request AES key a client sent in `ENC-KEY`.
pub fn unwrap_request_key(private: &RsaPrivateKey, headers: &HeaderMap) -> Vec<u8> {
    let wrapped = headers
        .get("ENC-KEY")
        .and_then(|v| v.to_str().ok())
        .expect("ENC-KEY header");
    private
        .decrypt(
            Pkcs1v15Encrypt,
            &Base64::decode_vec(wrapped).expect("wrapped key is Base64"),
        )
        .expect("unwrap AES key")
}

/// Decrypt a provider request field encrypted under `key`.
pub fn decrypt_request_field(key: &[u8], body: &Value, field: &str) -> String {
    let ciphertext = body.get(field).and_then(Value::as_str).unwrap_or_default();
    decrypt_field(key, &PROTOCOL_IV, ciphertext).expect("field decrypts")
}
