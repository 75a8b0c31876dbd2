// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::info;

use crate::{
    error::ApiError,
    providers::{AuthMethod, AuthRequest, AuthSession},
    state::AppState,
};

/// Reject blank PII and unknown auth method names before any upstream call.
fn validate(request: &AuthRequest) -> Result<(), ApiError> {
    for (field, value) in [
        ("userName", &request.user_name),
        ("birthDate", &request.birth_date),
        ("userCellphoneNumber", &request.user_cellphone_number),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::bad_request(format!("{field} is required")));
        }
    }

    if let Some(method) = request.auth_method.as_deref() {
        AuthMethod::from_method(method).map_err(|e| ApiError::bad_request(e.to_string()))?;
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/auth/request",
    request_body = AuthRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Handshake accepted", body = AuthSession),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Provider rejected the API key"),
        (status = 502, description = "Provider unavailable")
    )
)]
pub async fn request_auth(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<AuthSession>, ApiError> {
    validate(&request)?;
    info!(auth_method = %request.method(), "Simple-auth request");

    let session = state.auth.request(&request).await?;
    Ok(Json(session))
}

/// Same handshake, returning the provider's response untouched.
#[utoipa::path(
    post,
    path = "/v1/auth/request-raw",
    request_body = AuthRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Provider response", body = Object),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn request_auth_raw(
    State(state): State<AppState>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<Value>, ApiError> {
    validate(&request)?;
    let response = state.auth.request_raw(&request).await?;
    Ok(Json(response))
}
