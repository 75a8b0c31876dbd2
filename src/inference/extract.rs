// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pull the JSON array of disease names out of free-form model text.

use crate::providers::error::{ProviderError, ProviderResult};

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Best-effort isolation of the array text.
///
/// Tries, in order: a ```` ```json ```` fenced block, the span from the first
/// `[` to the last `]`, and finally the text unchanged.
pub fn extract_json_array(text: &str) -> &str {
    if let Some(start) = text.find(FENCE_OPEN).map(|i| i + FENCE_OPEN.len()) {
        if let Some(len) = text[start..].find(FENCE_CLOSE).filter(|&len| len > 0) {
            return text[start..start + len].trim();
        }
    }

    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if end > start {
            return &text[start..=end];
        }
    }

    text
}

/// Extract and parse the model's answer as a list of names. `null` entries are dropped.
pub fn parse_disease_names(text: &str) -> ProviderResult<Vec<String>> {
    let candidate = extract_json_array(text);
    let names: Vec<Option<String>> = serde_json::from_str(candidate)
        .map_err(|e| ProviderError::Extraction(format!("not a JSON array of strings: {e}")))?;
    Ok(names.into_iter().flatten().collect())
}
