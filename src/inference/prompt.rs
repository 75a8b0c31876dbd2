// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Disease inference prompt.
//!
//! The template and the allow-list are fixed. Only the prescription section
//! varies, and it is rendered from the records in their original order, so
//! the same records always produce the same prompt.

use std::fmt::Write;

use crate::prescriptions::PrescriptionRecord;

/// Conditions the model may answer with.
pub const ALLOWED_DISEASES: &[&str] = &[
    "뇌전증",
    "치매",
    "파킨슨병",
    "뇌졸중 후유증",
    "만성두통",
    "심부전",
    "고혈압",
    "관상동맥질환",
    "심방세동",
    "고지혈증",
    "COPD",
    "천식",
    "폐섬유화증",
    "수면무호흡증",
    "빈혈",
    "혈우병",
    "항응고치료중",
    "고형암",
    "혈액암",
    "당뇨병",
    "갑상선기능이상",
    "골다공증",
    "부신기능장애",
    "만성신부전",
    "투석환자",
    "신증후군",
    "간경변",
    "B형간염",
    "C형간염",
    "비알코올성지방간",
    "위염",
    "소화성궤양",
    "염증성장질환",
    "과민성장증후군",
    "류마티스관절염",
    "골관절염",
    "통풍",
    "전신홍반루푸스",
    "자가면역질환",
    "장기이식 후 면역억제 치료 중",
    "HIV",
    "결핵",
    "만성바이러스간염",
    "우울증",
    "조현병",
    "양극성장애",
    "불안장애",
    "PKU",
    "윌슨병",
    "헌팅턴병",
];

const TASK: &str = "환자의 처방 이력을 분석하여 기저질환을 최대 4개까지 추정하세요.";

const RULES: &[&str] = &[
    "동일 계열 약물이 총 14일 이상 또는 반복 처방된 경우만 기저질환으로 판단",
    "단기 처방(7일 이내)이면서 반복되지 않은 경우는 제외",
    "감기약, 소화제, 단순 진통제 등은 고려하지 않음",
    "판단이 모호한 경우는 제외",
    "아래 <allowed_diseases>에 있는 질환만 선택 가능",
];

const OUTPUT_FORMAT: &str = "반드시 JSON 배열 형식으로만 응답하세요. 다른 설명은 포함하지 마세요.
질환이 없으면 빈 배열 []을 반환하세요.

예시:
[\"고혈압\", \"당뇨병\", \"고지혈증\"]";

/// Full prompt for `records`.
pub fn render_prompt(records: &[PrescriptionRecord]) -> String {
    let mut prompt = String::new();

    let _ = writeln!(prompt, "<task>\n{TASK}\n</task>\n");

    prompt.push_str("<rules>\n");
    for rule in RULES {
        let _ = writeln!(prompt, "- {rule}");
    }
    prompt.push_str("</rules>\n\n");

    let _ = writeln!(
        prompt,
        "<allowed_diseases>\n{}\n</allowed_diseases>\n",
        ALLOWED_DISEASES.join(", ")
    );

    let _ = writeln!(
        prompt,
        "<prescription_data>\n{}</prescription_data>\n",
        render_prescriptions(records)
    );

    let _ = writeln!(prompt, "<output_format>\n{OUTPUT_FORMAT}\n</output_format>");
    prompt
}

/// One block per encounter: the date, then one line per drug.
///
/// Drugs without classification info are skipped, matching what the
/// medication endpoint returns for non-reimbursed items.
pub fn render_prescriptions(records: &[PrescriptionRecord]) -> String {
    let mut out = String::new();

    for record in records {
        let _ = writeln!(out, "진료일자: {}", or_blank(&record.encounter_date));

        for drug in &record.medications {
            let Some(class) = &drug.classification else {
                continue;
            };
            let _ = writeln!(
                out,
                "- 약물명: {}, 효능: {}, 투약일수: {}, 성분: {}, ATC분류: {}, KPIC분류: {}",
                or_blank(&drug.drug_name),
                or_blank(&drug.efficacy),
                or_blank(&drug.days_supplied),
                or_blank(&class.active_ingredient),
                or_blank(&class.atc_code),
                or_blank(&class.kpic_code),
            );
        }
        out.push('\n');
    }

    out
}

fn or_blank(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prescriptions::tests::{encounter, medication_response};
    use crate::prescriptions::{filter_prescriptions, MedicationDetail};

    fn records() -> Vec<PrescriptionRecord> {
        filter_prescriptions(&medication_response(vec![
            encounter("처방조제", "2024-01-10", "노바스크정5mg", "30"),
            encounter("처방조제", "2024-02-10", "리피토정10mg", "90"),
        ]))
        .prescriptions()
        .to_vec()
    }

    #[test]
    fn allow_list_has_fifty_labels() {
        assert_eq!(ALLOWED_DISEASES.len(), 50);
        assert!(ALLOWED_DISEASES.contains(&"고혈압"));
    }

    #[test]
    fn rendering_is_deterministic_and_ordered() {
        let records = records();
        let a = render_prompt(&records);
        let b = render_prompt(&records);
        assert_eq!(a, b);

        let first = a.find("2024-01-10").unwrap();
        let second = a.find("2024-02-10").unwrap();
        assert!(first < second);
    }

    #[test]
    fn drug_lines_carry_classification() {
        let text = render_prescriptions(&records());
        assert!(text.contains(
            "- 약물명: 노바스크정5mg, 효능: 혈압강하제, 투약일수: 30, 성분: amlodipine besylate, \
             ATC분류: C08CA01, KPIC분류: 칼슘채널차단제\n"
        ));
        assert!(text.starts_with("진료일자: 2024-01-10\n"));
    }

    #[test]
    fn drugs_without_classification_are_skipped() {
        let record = PrescriptionRecord {
            encounter_date: Some("2024-03-01".to_string()),
            encounter_type: "처방조제".to_string(),
            medication_count: None,
            medications: vec![MedicationDetail {
                drug_name: Some("비급여약".to_string()),
                efficacy: None,
                days_supplied: Some("3".to_string()),
                classification: None,
            }],
        };
        let text = render_prescriptions(&[record]);
        assert_eq!(text, "진료일자: 2024-03-01\n\n");
    }

    #[test]
    fn prompt_contains_all_sections() {
        let prompt = render_prompt(&[]);
        for tag in [
            "<task>",
            "<rules>",
            "<allowed_diseases>",
            "<prescription_data>",
            "<output_format>",
        ] {
            assert!(prompt.contains(tag), "missing {tag}");
        }
        assert!(prompt.contains("뇌전증, 치매, 파킨슨병"));
    }
}
