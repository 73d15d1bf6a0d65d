//! Main entry point for the orchestration core.

use std::sync::Arc;

use anyhow::Result;
use common::Config;
use wraith_core::crawler::UnconfiguredCrawler;
use wraith_core::env::EnvironmentProbe;
use wraith_core::ocr::UnconfiguredOcrEngine;
use wraith_core::state::AppState;
use wraith_core::{dispatcher, routes, stores, telemetry};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

async fn create_app_state(config: Arc<Config>, probe: EnvironmentProbe) -> AppState {
    let job_store = stores::job_store::build(probe, &config).await;
    let task_queue = stores::task_queue::build(probe, &config).await;
    let artifact_store = stores::artifact_store::build(probe, &config);

    AppState::new(
        config,
        job_store,
        task_queue,
        artifact_store,
        Arc::new(UnconfiguredCrawler),
        Arc::new(UnconfiguredOcrEngine),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let config = Arc::new(Config::from_env()?);
    let probe = EnvironmentProbe::from(config.as_ref());

    info!(
        "Starting Gnosis Wraith orchestration core v{} (cloud={})",
        env!("CARGO_PKG_VERSION"),
        probe.is_cloud()
    );

    let port = config.http_port;
    let state = create_app_state(config, probe).await;

    // The dispatcher replaces itself with the cloud queue's own delivery
    // mechanism in cloud mode, so it only runs locally.
    let dispatcher_shutdown = CancellationToken::new();
    if !probe.is_cloud() {
        info!("starting local task dispatcher");
        dispatcher::spawn(state.clone(), dispatcher_shutdown.clone());
    }

    let app = routes::build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind to address");

    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(dispatcher_shutdown))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler. Also stops the local dispatcher loop
/// so in-flight retries don't keep firing after the listener closes.
async fn shutdown_signal(dispatcher_shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
    dispatcher_shutdown.cancel();
}
