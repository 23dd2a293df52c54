// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::diagnostics::DiagnosticsService;
use crate::application::motor_service::MotorService;
use crate::application::sample_source::SampleSource;
use crate::application::simulation::RandomInterval;
use crate::domain::sample::MotorProfile;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::gemini_client::GeminiClient;
use crate::infrastructure::reference_dataset::REFERENCE_ROWS;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_motor, get_settings, health_check, list_motors, pause_motor, request_diagnosis,
    reset_all, reset_billing, reset_motor, start_motor, stream_motor, update_tariff,
};

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/motors", get(list_motors))
        .route("/motors/:id", get(get_motor))
        .route("/motors/:id/start", post(start_motor))
        .route("/motors/:id/pause", post(pause_motor))
        .route("/motors/:id/reset", post(reset_motor))
        .route("/motors/:id/billing/reset", post(reset_billing))
        .route("/motors/:id/diagnosis", post(request_diagnosis))
        .route("/motors/:id/stream", get(stream_motor))
        .route("/settings", get(get_settings))
        .route("/settings/tariff", put(update_tariff))
        .route("/reset", post(reset_all))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;

    // The simulation cannot run without a valid dataset
    let source = Arc::new(
        SampleSource::from_rows(REFERENCE_ROWS).context("invalid telemetry dataset")?,
    );

    // Narrative collaborator (infrastructure layer)
    let narrative = Arc::new(GeminiClient::new(&app_config.narrative)?);
    if app_config.narrative.api_key.as_deref().unwrap_or_default().is_empty() {
        tracing::warn!("no narrative API key configured; diagnoses will report the service as unavailable");
    }

    // Create services (application layer)
    let motor_service = MotorService::new(
        MotorProfile::presets(),
        source,
        app_config.billing.tariff_rate,
        Arc::new(RandomInterval::default()),
    );
    let diagnostics_service = DiagnosticsService::new(narrative);

    let state = Arc::new(AppState {
        motor_service,
        diagnostics_service,
    });

    // Note: bodies are Brotli-compressed by the handlers themselves,
    // so no CompressionLayer here to avoid double compression
    let addr: SocketAddr = app_config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address '{}'", app_config.server.bind_address))?;
    tracing::info!(address = %addr, tariff_rate = app_config.billing.tariff_rate.value(), "starting electroguard");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
