// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Completion Client
//!
//! [`CompletionClient`] sends one prompt to the completion API under a
//! [`RetryPolicy`]. [`DiseaseInferenceClient`] builds the prompt from
//! filtered prescriptions and turns the reply into a
//! [`DiseaseAnalysisResult`].
//!
//! Inference never fails the caller: missing credentials, exhausted retries
//! and unusable output all come back as a result with a non-success status.

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::extract::parse_disease_names;
use super::prompt::render_prompt;
use super::types::{CompletionMessage, CompletionRequest, CompletionResponse, DiseaseAnalysisResult};
use crate::config::{CompletionConfig, COMPLETION_API_KEY_ENV};
use crate::prescriptions::{medication_names, MedicationData};
use crate::providers::error::{ProviderError, ProviderResult};
use crate::providers::retry::RetryPolicy;

const TEMPERATURE: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: Client,
    config: CompletionConfig,
    retry: RetryPolicy,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig, http: Client) -> Self {
        Self {
            http,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Send `prompt`, retrying transient failures per the policy.
    pub async fn complete(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> ProviderResult<CompletionResponse> {
        let api_key = self
            .api_key()
            .ok_or_else(|| ProviderError::MissingConfig(COMPLETION_API_KEY_ENV.to_string()))?;

        self.retry
            .run(cancel, |attempt| self.send_once(api_key, prompt, attempt))
            .await
    }

    async fn send_once(
        &self,
        api_key: &str,
        prompt: &str,
        attempt: u32,
    ) -> ProviderResult<CompletionResponse> {
        let request = CompletionRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: TEMPERATURE,
            messages: vec![CompletionMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(attempt, model = %self.config.model, "Completion request");

        let response = self
            .http
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("completion request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(format!("completion body read failed: {e}")))?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status, "completion API", &body));
        }
        // A 2xx reply was delivered; an unreadable body is not retried.
        if body.trim().is_empty() {
            return Err(ProviderError::Extraction(
                "completion API returned an empty body".to_string(),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::Extraction(format!("completion response invalid JSON: {e}")))
    }
}

#[derive(Debug, Clone)]
pub struct DiseaseInferenceClient {
    completion: CompletionClient,
}

impl DiseaseInferenceClient {
    pub fn new(completion: CompletionClient) -> Self {
        Self { completion }
    }

    pub fn has_api_key(&self) -> bool {
        self.completion.has_api_key()
    }

    /// Infer candidate chronic conditions from filtered medication history.
    pub async fn analyze(
        &self,
        medication: &MedicationData,
        cancel: &CancellationToken,
    ) -> DiseaseAnalysisResult {
        let records = medication.prescriptions();
        let names = medication_names(records);

        if !medication.is_filtered() {
            warn!("Analyzing unfiltered medication data, prescription section will be empty");
        }

        let result = match self.run(&render_prompt(records), cancel).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Disease inference failed");
                DiseaseAnalysisResult::error(e)
            }
        };

        info!(
            status = ?result.status,
            risk_level = ?result.risk_level,
            diseases = result.predicted_diseases.len(),
            medications = names.len(),
            "Disease inference finished"
        );
        result.with_medication_names(names)
    }

    async fn run(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> ProviderResult<DiseaseAnalysisResult> {
        let response = match self.completion.complete(prompt, cancel).await {
            Ok(response) => response,
            Err(ProviderError::Extraction(e)) => {
                warn!(error = %e, "Completion reply body unusable");
                return Ok(DiseaseAnalysisResult::partial());
            }
            Err(e) => return Err(e),
        };

        if let Some(usage) = response.usage {
            info!(
                response_id = ?response.id,
                stop_reason = ?response.stop_reason,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Completion usage"
            );
        }

        let Some(text) = response.first_text() else {
            warn!("Completion response has no content");
            return Ok(DiseaseAnalysisResult::partial());
        };

        match parse_disease_names(text) {
            Ok(names) => Ok(DiseaseAnalysisResult::success(&names)),
            Err(e) => {
                warn!(error = %e, "Model output was not a disease list");
                Ok(DiseaseAnalysisResult::partial())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{
        extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse,
        routing::post, Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::inference::types::{AnalysisStatus, RiskLevel};
    use crate::prescriptions::filter_prescriptions;
    use crate::prescriptions::tests::{encounter, medication_response};
    use crate::providers::transport::build_http_client;
    use crate::test_support::spawn_mock;

    const COMPLETION_KEY: &str = "completion-key";

    #[derive(Clone)]
    struct Script {
        replies: Arc<Mutex<Vec<(StatusCode, Value)>>>,
        hits: Arc<AtomicU32>,
        last_request: Arc<Mutex<Option<(HeaderMap, Value)>>>,
    }

    async fn scripted(
        State(script): State<Script>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        script.hits.fetch_add(1, Ordering::SeqCst);
        *script.last_request.lock().unwrap() = Some((headers, body));
        let mut replies = script.replies.lock().unwrap();
        let (status, reply) = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        };
        (status, Json(reply))
    }

    /// Completion mock answering with `replies` in order, repeating the last.
    async fn completion_mock(replies: Vec<(StatusCode, Value)>) -> (String, Script) {
        let script = Script {
            replies: Arc::new(Mutex::new(replies)),
            hits: Arc::new(AtomicU32::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        };
        let router = Router::new()
            .route("/v1/messages", post(scripted))
            .with_state(script.clone());
        let base = spawn_mock(router).await;
        (format!("{base}/v1/messages"), script)
    }

    fn text_reply(text: &str) -> (StatusCode, Value) {
        (
            StatusCode::OK,
            json!({
                "id": "msg_1",
                "type": "message",
                "content": [{ "type": "text", "text": text }],
                "stop_reason": "end_turn",
                "usage": { "input_tokens": 812, "output_tokens": 9 }
            }),
        )
    }

    fn client(url: &str, key: Option<&str>) -> DiseaseInferenceClient {
        let completion = CompletionClient::new(
            CompletionConfig::with_url(url, key.map(str::to_string)),
            build_http_client().unwrap(),
        )
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
        });
        DiseaseInferenceClient::new(completion)
    }

    fn hypertension_history() -> MedicationData {
        filter_prescriptions(&medication_response(vec![
            encounter("처방조제", "2024-01-10", "노바스크정5mg", "30"),
            encounter("진찰", "2024-01-10", "", "0"),
        ]))
    }

    #[tokio::test]
    async fn end_to_end_prescription_to_disease() {
        let (url, script) = completion_mock(vec![text_reply("[\"고혈압\"]")]).await;
        let medication = hypertension_history();
        assert_eq!(medication.prescriptions().len(), 1);

        let result = client(&url, Some(COMPLETION_KEY))
            .analyze(&medication, &CancellationToken::new())
            .await;

        assert_eq!(result.status, AnalysisStatus::Success);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.predicted_diseases.len(), 1);
        assert_eq!(result.predicted_diseases[0].disease_name, "고혈압");
        assert_eq!(result.medication_names, vec!["노바스크정5mg"]);
        assert_eq!(script.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn request_carries_headers_and_prompt() {
        let (url, script) = completion_mock(vec![text_reply("[]")]).await;

        let result = client(&url, Some(COMPLETION_KEY))
            .analyze(&hypertension_history(), &CancellationToken::new())
            .await;
        assert_eq!(result.risk_level, RiskLevel::Low);

        let (headers, body) = script.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(headers["x-api-key"], COMPLETION_KEY);
        assert_eq!(headers["anthropic-version"], "2023-06-01");
        assert_eq!(body["temperature"], json!(0.3));
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "user");
        let prompt = body["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains("노바스크정5mg"));
        assert!(prompt.contains("<allowed_diseases>"));
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let (url, script) = completion_mock(vec![(
            StatusCode::UNAUTHORIZED,
            json!({ "type": "error", "error": { "type": "authentication_error" } }),
        )])
        .await;

        let result = client(&url, Some("bad-key"))
            .analyze(&hypertension_history(), &CancellationToken::new())
            .await;

        assert_eq!(result.status, AnalysisStatus::Error);
        assert_eq!(result.risk_level, RiskLevel::Unknown);
        assert!(result.predicted_diseases.is_empty());
        assert_eq!(script.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rate_limit_then_success_recovers() {
        let (url, script) = completion_mock(vec![
            (StatusCode::TOO_MANY_REQUESTS, json!({})),
            (StatusCode::from_u16(529).unwrap(), json!({})),
            text_reply("```json\n[\"고지혈증\", \"당뇨병\"]\n```"),
        ])
        .await;

        let result = client(&url, Some(COMPLETION_KEY))
            .analyze(&hypertension_history(), &CancellationToken::new())
            .await;

        assert_eq!(result.status, AnalysisStatus::Success);
        assert_eq!(result.predicted_diseases.len(), 2);
        assert_eq!(script.hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_become_error_result() {
        let (url, script) =
            completion_mock(vec![(StatusCode::TOO_MANY_REQUESTS, json!({}))]).await;

        let result = client(&url, Some(COMPLETION_KEY))
            .analyze(&hypertension_history(), &CancellationToken::new())
            .await;

        assert_eq!(result.status, AnalysisStatus::Error);
        assert!(result.message.starts_with("AI 분석 중 오류가 발생했습니다: "));
        assert_eq!(script.hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_key_makes_no_call() {
        let (url, script) = completion_mock(vec![text_reply("[\"고혈압\"]")]).await;

        for key in [None, Some("  ")] {
            let result = client(&url, key)
                .analyze(&hypertension_history(), &CancellationToken::new())
                .await;
            assert_eq!(result.status, AnalysisStatus::Error);
            assert!(result.message.contains(COMPLETION_API_KEY_ENV));
        }
        assert_eq!(script.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_content_is_partial_success() {
        let (url, _) = completion_mock(vec![(
            StatusCode::OK,
            json!({ "id": "msg_2", "content": [], "stop_reason": "end_turn" }),
        )])
        .await;

        let result = client(&url, Some(COMPLETION_KEY))
            .analyze(&hypertension_history(), &CancellationToken::new())
            .await;

        assert_eq!(result.status, AnalysisStatus::PartialSuccess);
        assert_eq!(result.risk_level, RiskLevel::Unknown);
    }

    #[tokio::test]
    async fn non_json_success_body_is_partial_without_retry() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/v1/messages",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "<html>gateway says hi</html>"
                }
            }),
        );
        let url = format!("{}/v1/messages", spawn_mock(router).await);

        let result = client(&url, Some(COMPLETION_KEY))
            .analyze(&hypertension_history(), &CancellationToken::new())
            .await;

        assert_eq!(result.status, AnalysisStatus::PartialSuccess);
        assert_eq!(result.risk_level, RiskLevel::Unknown);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn complete_surfaces_authentication_error() {
        let (url, script) = completion_mock(vec![(
            StatusCode::UNAUTHORIZED,
            json!({ "type": "error", "error": { "type": "authentication_error" } }),
        )])
        .await;
        let completion = CompletionClient::new(
            CompletionConfig::with_url(url, Some("bad-key".to_string())),
            build_http_client().unwrap(),
        );

        let result = completion
            .complete("prompt", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ProviderError::Authentication(_))));
        assert_eq!(script.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prose_without_array_is_partial_success() {
        let (url, _) = completion_mock(vec![text_reply("판단할 수 없습니다.")]).await;

        let result = client(&url, Some(COMPLETION_KEY))
            .analyze(&hypertension_history(), &CancellationToken::new())
            .await;

        assert_eq!(result.status, AnalysisStatus::PartialSuccess);
        assert_eq!(
            result.message,
            "분석은 완료되었으나 결과 파싱에 오류가 발생했습니다."
        );
        assert!(result.predicted_diseases.is_empty());
    }

    #[tokio::test]
    async fn cancelled_run_returns_error_result() {
        let (url, script) = completion_mock(vec![text_reply("[]")]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client(&url, Some(COMPLETION_KEY))
            .analyze(&hypertension_history(), &cancel)
            .await;

        assert_eq!(result.status, AnalysisStatus::Error);
        assert_eq!(script.hits.load(Ordering::SeqCst), 0);
    }
}
