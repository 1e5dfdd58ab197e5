// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use shiftline::application::clock::PlantClock;
use shiftline::application::shift_report_service::ShiftReportService;
use shiftline::infrastructure::config::{load_app_config, load_shift_definitions};
use shiftline::infrastructure::http_telemetry_repository::HttpTelemetryRepository;
use shiftline::presentation::app_state::AppState;
use shiftline::presentation::handlers::{
    health_check, list_machines, list_shifts, machine_shifts, stream_machine_shifts,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config().context("Failed to load config/app")?;
    let shifts = load_shift_definitions().context("Failed to load config/shifts")?;

    // Plant clock and repository (infrastructure layer)
    let clock = Arc::new(PlantClock::new(app_config.engine.utc_offset_minutes)?);
    let api = &app_config.telemetry_api;
    let repository = Arc::new(HttpTelemetryRepository::new(
        api.base_url.clone(),
        api.token.clone(),
        clock.offset(),
        Duration::from_secs(api.timeout_secs),
    )?);

    // Services (application layer)
    let report_service = ShiftReportService::new(repository, shifts, app_config.engine.clone(), api.record_limit);

    let state = Arc::new(AppState {
        report_service,
        clock,
        poll_interval: Duration::from_millis(app_config.engine.poll_interval_ms),
    });

    // Compression is handled in the response builders, not by a layer
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/shifts", get(list_shifts))
        .route("/machines", get(list_machines))
        .route("/machines/:code/shifts", get(machine_shifts))
        .route("/machines/:code/shifts/stream", get(stream_machine_shifts))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = app_config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind_addr))?;
    tracing::info!("Starting shiftline service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
