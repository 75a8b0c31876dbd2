// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    inference::{AnalysisStatus, DiseaseAnalysisResult, PredictedDisease, RiskLevel},
    prescriptions::{
        DrugClassification, FilteredPrescriptions, MedicationData, MedicationDetail,
        PrescriptionRecord, UnfilteredMedication,
    },
    providers::{AuthMethod, AuthRequest, AuthSession, IntegratedHealthData},
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod records;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/request", post(auth::request_auth))
        .route("/auth/request-raw", post(auth::request_auth_raw))
        .route("/health/integrated", post(records::integrated_health_data))
        .route("/health/disease-analysis", post(records::disease_analysis));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::request_auth,
        auth::request_auth_raw,
        records::integrated_health_data,
        records::disease_analysis
    ),
    components(
        schemas(
            health::HealthResponse,
            AuthMethod,
            AuthRequest,
            AuthSession,
            IntegratedHealthData,
            MedicationData,
            FilteredPrescriptions,
            UnfilteredMedication,
            PrescriptionRecord,
            MedicationDetail,
            DrugClassification,
            DiseaseAnalysisResult,
            PredictedDisease,
            AnalysisStatus,
            RiskLevel
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Provider simple-auth handshake"),
        (name = "Health Records", description = "Record retrieval and disease inference")
    )
)]
struct ApiDoc;
