// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::inference::{CompletionClient, DiseaseInferenceClient};
use crate::providers::error::ProviderResult;
use crate::providers::transport::build_http_client;
use crate::providers::{AuthHandshakeClient, HealthRecordClient, ProviderTransport};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthHandshakeClient>,
    pub records: Arc<HealthRecordClient>,
    pub inference: Arc<DiseaseInferenceClient>,
    /// Cancelled on shutdown; in-flight inference retries stop waiting.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, shutdown: CancellationToken) -> ProviderResult<Self> {
        let http = build_http_client()?;
        let transport = ProviderTransport::new(&config.provider, http.clone());
        let completion = CompletionClient::new(config.completion, http);

        Ok(Self {
            auth: Arc::new(AuthHandshakeClient::new(transport.clone())),
            records: Arc::new(HealthRecordClient::new(transport)),
            inference: Arc::new(DiseaseInferenceClient::new(completion)),
            shutdown,
        })
    }
}
