// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Health Insight - provider-authenticated medication analysis service
//!
//! Authenticates a user against the NHIS simple-auth provider with a
//! per-request hybrid encryption handshake, retrieves checkup and medication
//! history, narrows the medication history to prescription dispensing and
//! asks a completion API for candidate chronic conditions.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `config` - Environment configuration
//! - `crypto` - AES/RSA hybrid field encryption
//! - `providers` - Provider clients, shared error type and retry policy
//! - `prescriptions` - Prescription filtering
//! - `inference` - Disease inference over the completion API

pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod inference;
pub mod prescriptions;
pub mod providers;
pub mod state;

#[cfg(test)]
mod test_support;
