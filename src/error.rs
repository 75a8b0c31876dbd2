// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::providers::error::ProviderError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        let status = match &e {
            ProviderError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ProviderError::RateLimited(_) | ProviderError::Overloaded(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ProviderError::Transport(_) | ProviderError::Extraction(_) => StatusCode::BAD_GATEWAY,
            ProviderError::Encryption(_) | ProviderError::MissingConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProviderError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            error!(error = %e, status = status.as_u16(), "Upstream call failed");
        }
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
