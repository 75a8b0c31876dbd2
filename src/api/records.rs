// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    inference::DiseaseAnalysisResult,
    providers::{AuthSession, IntegratedHealthData},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/health/integrated",
    request_body = AuthSession,
    tag = "Health Records",
    responses(
        (status = 200, description = "Checkup and filtered medication history", body = IntegratedHealthData),
        (status = 401, description = "Provider rejected the API key"),
        (status = 502, description = "Provider unavailable")
    )
)]
pub async fn integrated_health_data(
    State(state): State<AppState>,
    Json(session): Json<AuthSession>,
) -> Result<Json<IntegratedHealthData>, ApiError> {
    let data = state.records.fetch_integrated(&session).await?;
    Ok(Json(data))
}

/// Fetch medication history and infer candidate chronic conditions.
///
/// Retrieval failures are HTTP errors. Inference failures are reported inside
/// the result's `status`.
#[utoipa::path(
    post,
    path = "/v1/health/disease-analysis",
    request_body = AuthSession,
    tag = "Health Records",
    responses(
        (status = 200, description = "Analysis result", body = DiseaseAnalysisResult),
        (status = 401, description = "Provider rejected the API key"),
        (status = 502, description = "Provider unavailable")
    )
)]
pub async fn disease_analysis(
    State(state): State<AppState>,
    Json(session): Json<AuthSession>,
) -> Result<Json<DiseaseAnalysisResult>, ApiError> {
    let medication = state.records.fetch_medication(&session).await?;
    let result = state.inference.analyze(&medication, &state.shutdown).await;
    Ok(Json(result))
}
