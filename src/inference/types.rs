// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Disease analysis result types and the completion API wire types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const CONFIDENCE_ESTIMATED: &str = "추정";
pub const RATIONALE_PRESCRIPTION_PATTERN: &str = "처방 패턴 분석 결과";
pub const ANALYSIS_REASON: &str = "처방 데이터 패턴 분석을 통한 기저질환 추정";

pub const MESSAGE_SUCCESS: &str = "기저질환 분석이 완료되었습니다.";
pub const MESSAGE_PARSE_FAILED: &str = "분석은 완료되었으나 결과 파싱에 오류가 발생했습니다.";
pub const MESSAGE_ERROR_PREFIX: &str = "AI 분석 중 오류가 발생했습니다: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Success,
    PartialSuccess,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictedDisease {
    pub disease_name: String,
    /// Confidence label. The model is not asked for one, so this is a placeholder.
    pub probability: String,
    pub reason: String,
    pub related_medications: Vec<String>,
}

impl PredictedDisease {
    pub fn estimated(name: &str) -> Self {
        Self {
            disease_name: name.to_string(),
            probability: CONFIDENCE_ESTIMATED.to_string(),
            reason: RATIONALE_PRESCRIPTION_PATTERN.to_string(),
            related_medications: Vec::new(),
        }
    }
}

/// Terminal outcome of one inference run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseAnalysisResult {
    pub status: AnalysisStatus,
    pub message: String,
    pub risk_level: RiskLevel,
    pub predicted_diseases: Vec<PredictedDisease>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_reason: Option<String>,
    /// Drug names that were submitted to the model.
    pub medication_names: Vec<String>,
}

impl DiseaseAnalysisResult {
    /// Model answer parsed into `names`. Blank entries are dropped.
    pub fn success(names: &[String]) -> Self {
        let predicted_diseases: Vec<PredictedDisease> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(PredictedDisease::estimated)
            .collect();

        let risk_level = if predicted_diseases.is_empty() {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };

        Self {
            status: AnalysisStatus::Success,
            message: MESSAGE_SUCCESS.to_string(),
            risk_level,
            predicted_diseases,
            recommendations: vec!["의료진과 상담 권장".to_string(), "정기적인 건강검진".to_string()],
            analysis_reason: Some(ANALYSIS_REASON.to_string()),
            medication_names: Vec::new(),
        }
    }

    /// The model answered but its output was not a usable JSON array.
    pub fn partial() -> Self {
        Self {
            status: AnalysisStatus::PartialSuccess,
            message: MESSAGE_PARSE_FAILED.to_string(),
            risk_level: RiskLevel::Unknown,
            predicted_diseases: Vec::new(),
            recommendations: Vec::new(),
            analysis_reason: None,
            medication_names: Vec::new(),
        }
    }

    pub fn error(detail: impl std::fmt::Display) -> Self {
        Self {
            status: AnalysisStatus::Error,
            message: format!("{MESSAGE_ERROR_PREFIX}{detail}"),
            risk_level: RiskLevel::Unknown,
            predicted_diseases: Vec::new(),
            recommendations: Vec::new(),
            analysis_reason: None,
            medication_names: Vec::new(),
        }
    }

    pub fn with_medication_names(mut self, names: Vec<String>) -> Self {
        self.medication_names = names;
        self
    }
}

// Completion API wire types.

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f64,
    pub messages: Vec<CompletionMessage<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Text of the first content block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(|block| block.text.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}
