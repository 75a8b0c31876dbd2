// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Health Record Retrieval
//!
//! Follow-up calls made with an authenticated [`AuthSession`]: the health
//! checkup history and the medication history.
//!
//! Each call fetches the provider key and builds its own
//! [`EncryptionContext`]. The session's tagged PII is stripped of its
//! [`ENC_MARKER`](super::simple_auth::ENC_MARKER) and encrypted again under
//! the new key. The session identifiers travel in clear.

use serde::Serialize;
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;

use super::error::{ProviderError, ProviderResult};
use super::key_exchange::KeyExchangeClient;
use super::simple_auth::{strip_marker, AuthSession};
use super::transport::ProviderTransport;
use crate::crypto::EncryptionContext;
use crate::prescriptions::{filter_prescriptions, MedicationData};

pub const CHECKUP_PATH: &str = "/api/v1.0/nhissimpleauth/ggpab003m0105";
pub const MEDICATION_PATH: &str =
    "/api/v1.0/nhissimpleauth/retrievetreatmentinjectioninformationperson";

/// Checkup and filtered medication history for one session.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedHealthData {
    #[serde(rename = "healthCheckupData")]
    #[schema(value_type = Object)]
    pub checkup: Value,
    #[serde(rename = "medicationData")]
    pub medication: MedicationData,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct HealthRecordClient {
    transport: ProviderTransport,
    key_exchange: KeyExchangeClient,
}

impl HealthRecordClient {
    pub fn new(transport: ProviderTransport) -> Self {
        Self {
            key_exchange: KeyExchangeClient::new(transport.clone()),
            transport,
        }
    }

    /// Health checkup history, returned as the provider sent it.
    pub async fn fetch_checkup(&self, session: &AuthSession) -> ProviderResult<Value> {
        let response = self.post_with_session(CHECKUP_PATH, session).await?;
        info!(tx_id = ?session.tx_id(), "Fetched health checkup history");
        Ok(response)
    }

    /// Medication history narrowed to prescription dispensing.
    pub async fn fetch_medication(&self, session: &AuthSession) -> ProviderResult<MedicationData> {
        let response = self.post_with_session(MEDICATION_PATH, session).await?;
        let data = filter_prescriptions(&response);
        info!(
            tx_id = ?session.tx_id(),
            filtered = data.is_filtered(),
            prescriptions = data.prescriptions().len(),
            "Fetched medication history"
        );
        Ok(data)
    }

    /// Both histories. Either call failing fails the whole fetch.
    pub async fn fetch_integrated(
        &self,
        session: &AuthSession,
    ) -> ProviderResult<IntegratedHealthData> {
        let checkup = self.fetch_checkup(session).await?;
        let medication = self.fetch_medication(session).await?;

        Ok(IntegratedHealthData {
            checkup,
            medication,
            status: "SUCCESS".to_string(),
            message: "통합 건강 정보 조회 완료".to_string(),
        })
    }

    async fn post_with_session(&self, path: &str, session: &AuthSession) -> ProviderResult<Value> {
        let public_key = self.key_exchange.fetch_public_key().await?;
        let context = EncryptionContext::new(&public_key)?;

        let mut body = session.identifiers();
        let fields = body.as_object_mut().ok_or_else(|| {
            ProviderError::Transport("session identifiers are not an object".to_string())
        })?;
        fields.insert(
            "UserName".to_string(),
            Value::String(context.encrypt(strip_marker(session.user_name()))?),
        );
        fields.insert(
            "BirthDate".to_string(),
            Value::String(context.encrypt(strip_marker(session.birth_date()))?),
        );
        fields.insert(
            "UserCellphoneNumber".to_string(),
            Value::String(context.encrypt(strip_marker(session.phone_number()))?),
        );

        self.transport
            .post_encrypted(path, context.wrapped_key(), &body)
            .await
    }
}
