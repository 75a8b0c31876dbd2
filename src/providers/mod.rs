// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clients for the identity/health-data provider, plus the error type and
//! retry policy shared with the completion client.

pub mod error;
pub mod health_records;
pub mod key_exchange;
pub mod retry;
pub mod simple_auth;
pub mod transport;

pub use error::{ProviderError, ProviderResult};
pub use health_records::{HealthRecordClient, IntegratedHealthData};
pub use key_exchange::KeyExchangeClient;
pub use retry::RetryPolicy;
pub use simple_auth::{AuthHandshakeClient, AuthMethod, AuthRequest, AuthSession};
pub use transport::ProviderTransport;
