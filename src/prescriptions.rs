// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Prescription Filter
//!
//! Narrows the provider's medication history to prescription-dispensing
//! encounters and projects only the fields disease inference needs.
//!
//! The medication endpoint's response is read as a generic JSON tree because
//! its field casing differs from the other provider endpoints. This module is
//! the single place that knows that shape; everything downstream works on
//! [`PrescriptionRecord`].
//!
//! A response that does not have the expected shape is passed through
//! unchanged inside [`MedicationData::Unfiltered`] instead of failing the
//! request. Callers must check [`MedicationData::is_filtered`].

use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use utoipa::ToSchema;

/// `JinRyoHyungTae` value for prescription dispensing. The only kept type.
pub const PRESCRIPTION_DISPENSING: &str = "처방조제";

const DATA_PURPOSE: &str = "기저질환 분석용 데이터";

/// Drug classification carried through from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct DrugClassification {
    #[serde(rename = "CmpnInfo")]
    pub active_ingredient: Option<String>,
    #[serde(rename = "FomlCdXplnCnte")]
    pub formulation: Option<String>,
    #[serde(rename = "MdctPathXplnCnte")]
    pub route: Option<String>,
    #[serde(rename = "AtcInfo")]
    pub atc_code: Option<String>,
    #[serde(rename = "KpicInfo")]
    pub kpic_code: Option<String>,
}

/// One dispensed drug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MedicationDetail {
    #[serde(rename = "ChoBangYakPumMyung")]
    pub drug_name: Option<String>,
    #[serde(rename = "ChoBangYakPumHyoneung")]
    pub efficacy: Option<String>,
    #[serde(rename = "TuyakIlSoo")]
    pub days_supplied: Option<String>,
    #[serde(rename = "DrugDetailInfo", skip_serializing_if = "Option::is_none")]
    pub classification: Option<DrugClassification>,
}

/// One prescription-dispensing encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PrescriptionRecord {
    #[serde(rename = "JinRyoGaesiIl")]
    pub encounter_date: Option<String>,
    #[serde(rename = "JinRyoHyungTae")]
    pub encounter_type: String,
    #[serde(rename = "TuYakYoYangHoiSoo")]
    pub medication_count: Option<String>,
    #[serde(rename = "MedicationDetails")]
    pub medications: Vec<MedicationDetail>,
}

/// Successfully filtered medication history.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FilteredPrescriptions {
    #[serde(rename = "PrescriptionData")]
    pub prescriptions: Vec<PrescriptionRecord>,
    #[serde(rename = "FilterMessage")]
    pub filter_message: String,
    #[serde(rename = "DataPurpose")]
    pub data_purpose: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Message")]
    pub message: String,
}

/// Provider payload that could not be filtered, returned unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UnfilteredMedication {
    #[serde(rename = "FilterFailed")]
    pub filter_failed: bool,
    #[serde(rename = "FilterMessage")]
    pub filter_message: String,
    #[serde(rename = "RawData")]
    #[schema(value_type = Object)]
    pub raw: Value,
}

/// Result of [`filter_prescriptions`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum MedicationData {
    Filtered(FilteredPrescriptions),
    Unfiltered(UnfilteredMedication),
}

impl MedicationData {
    pub fn is_filtered(&self) -> bool {
        matches!(self, MedicationData::Filtered(_))
    }

    /// Kept encounters; empty when filtering failed.
    pub fn prescriptions(&self) -> &[PrescriptionRecord] {
        match self {
            MedicationData::Filtered(filtered) => &filtered.prescriptions,
            MedicationData::Unfiltered(_) => &[],
        }
    }

    fn unfiltered(raw: &Value, reason: &str) -> Self {
        warn!(reason, "Medication response not filterable, passing through");
        MedicationData::Unfiltered(UnfilteredMedication {
            filter_failed: true,
            filter_message: format!("처방 데이터 필터링 실패: {reason}"),
            raw: raw.clone(),
        })
    }
}

/// Keep only `처방조제` encounters from a medication response, in order.
pub fn filter_prescriptions(raw: &Value) -> MedicationData {
    let Some(response) = raw.as_object() else {
        return MedicationData::unfiltered(raw, "response is not a JSON object");
    };
    let Some(items) = response.get("ResultList").and_then(Value::as_array) else {
        return MedicationData::unfiltered(raw, "ResultList is missing or not an array");
    };

    let prescriptions: Vec<PrescriptionRecord> = items
        .iter()
        .filter(|item| {
            item.get("JinRyoHyungTae").and_then(Value::as_str) == Some(PRESCRIPTION_DISPENSING)
        })
        .map(project_record)
        .collect();

    MedicationData::Filtered(FilteredPrescriptions {
        filter_message: format!(
            "{PRESCRIPTION_DISPENSING} 데이터만 필터링 완료. 총 {}건",
            prescriptions.len()
        ),
        prescriptions,
        data_purpose: DATA_PURPOSE.to_string(),
        status: scalar(response.get("Status")).unwrap_or_else(|| "OK".to_string()),
        message: scalar(response.get("Message")).unwrap_or_else(|| "성공".to_string()),
    })
}

/// Distinct-in-order, non-blank drug names across `records`.
pub fn medication_names(records: &[PrescriptionRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in records
        .iter()
        .flat_map(|r| &r.medications)
        .filter_map(|m| m.drug_name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn project_record(item: &Value) -> PrescriptionRecord {
    let medications = item
        .get("RetrieveTreatmentInjectionInformationPersonDetailList")
        .and_then(Value::as_array)
        .map(|details| {
            details
                .iter()
                .filter(|d| d.is_object())
                .map(project_medication)
                .collect()
        })
        .unwrap_or_default();

    PrescriptionRecord {
        encounter_date: scalar(item.get("JinRyoGaesiIl")),
        encounter_type: PRESCRIPTION_DISPENSING.to_string(),
        medication_count: scalar(item.get("TuYakYoYangHoiSoo")),
        medications,
    }
}

fn project_medication(detail: &Value) -> MedicationDetail {
    let classification = detail
        .get("RetrieveMdsupDtlInfo")
        .filter(|info| info.is_object())
        .map(|info| DrugClassification {
            active_ingredient: scalar(info.get("CmpnInfo")),
            formulation: scalar(info.get("FomlCdXplnCnte")),
            route: scalar(info.get("MdctPathXplnCnte")),
            atc_code: scalar(info.get("AtcInfo")),
            kpic_code: scalar(info.get("KpicInfo")),
        });

    MedicationDetail {
        drug_name: scalar(detail.get("ChoBangYakPumMyung")),
        efficacy: scalar(detail.get("ChoBangYakPumHyoneung")),
        days_supplied: scalar(detail.get("TuyakIlSoo")),
        classification,
    }
}

/// Provider scalars arrive as strings or numbers depending on the field.
fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
