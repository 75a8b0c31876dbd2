// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Disease Inference
//!
//! Filtered prescriptions in, [`DiseaseAnalysisResult`] out:
//!
//! - [`prompt`]: fixed template with the allowed-condition list
//! - [`client`]: resilient completion API call
//! - [`extract`]: JSON array recovery from model text
//! - [`types`]: result and wire types

pub mod client;
pub mod extract;
pub mod prompt;
pub mod types;

pub use client::{CompletionClient, DiseaseInferenceClient};
pub use types::{AnalysisStatus, DiseaseAnalysisResult, PredictedDisease, RiskLevel};
