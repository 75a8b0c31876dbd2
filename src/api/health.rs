// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness response with configuration status.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// "ok" when a completion API key is configured, "disabled" otherwise.
    pub inference: String,
    pub checked_at: DateTime<Utc>,
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running. Upstreams are not contacted.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let inference = if state.inference.has_api_key() {
        "ok"
    } else {
        "disabled"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        inference: inference.to_string(),
        checked_at: Utc::now(),
    })
}
