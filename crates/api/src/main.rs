//! Fault Diagnosis Pipeline - Service Entry Point
//!
//! Wires the diagnosers, storage, and alerting together and serves the
//! HTTP API. Model initialization (train-or-load) happens eagerly here,
//! before the listener starts, so no request can race it.

use std::net::SocketAddr;
use std::path::Path;

use alerting::AlertManager;
use anyhow::Context;
use api::{create_router, init_logging, AppState, Settings};
use fault_model::ModelDiagnoser;
use metrics_exporter_prometheus::PrometheusBuilder;
use orchestrator::Orchestrator;
use rule_engine::RuleEngine;
use storage::Repository;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Fault Diagnosis Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("failed to load configuration")?;

    let repository = Repository::connect(&settings.database.url)
        .await
        .with_context(|| format!("failed to open database {}", settings.database.url))?;

    // Corrupt or partial persisted state is fatal here; the error message
    // names the recovery step (remove both blobs to retrain).
    let model = ModelDiagnoser::init(Path::new(&settings.model.dir))
        .context("fault model unavailable")?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    let orchestrator = Orchestrator::new(
        RuleEngine::default(),
        model,
        repository,
        AlertManager::new(settings.alerts.clone()),
    );

    let state = AppState::new(orchestrator, metrics);
    let app = create_router(state, &settings.rate_limit);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
