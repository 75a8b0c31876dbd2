// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use health_insight_server::api::router;
use health_insight_server::config::{AppConfig, LOG_FORMAT_ENV};
use health_insight_server::state::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Key presence and length only. Values are never logged.
fn describe_secret(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("set ({} chars)", v.len()),
        _ => "not set".to_string(),
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env()?;
    info!(
        provider_base_url = %config.provider.base_url,
        provider_api_key = %describe_secret(Some(&config.provider.api_key)),
        completion_api_url = %config.completion.api_url,
        completion_api_key = %describe_secret(config.completion.api_key.as_deref()),
        completion_model = %config.completion.model,
        completion_max_tokens = config.completion.max_tokens,
        "Configuration loaded"
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let shutdown = CancellationToken::new();
    let state = AppState::new(config, shutdown.clone())?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Health Insight server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}
