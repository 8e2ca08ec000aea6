//! Privtier - Privacy-tiered cache and retention engine
//!
//! Serves the cache, aggregation, and retention API over HTTP with the
//! background sweep and retention tasks running alongside.

mod analytics;
mod api;
mod cache;
mod config;
mod error;
mod models;
mod policy;
mod retention;
mod tasks;
mod warmer;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use retention::CancelHandle;
use tasks::{spawn_cleanup_task, spawn_retention_task};

/// Main entry point for the engine.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables and validate it
/// 3. Construct the cache, archiver, and warmer
/// 4. Start the expiry sweep and retention background tasks
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "privtier=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting privacy-tiered cache and retention engine");

    // Load and validate configuration before constructing anything
    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: port={}, k_threshold={}, cycle_interval={}s, cleanup_interval={}s",
        config.server_port, config.k_threshold, config.cycle_interval_secs,
        config.cleanup_interval_secs
    );

    // Construct shared state: cache, archiver over the record store, warmer
    let state = AppState::from_config(&config);
    info!("Cache, archiver, and warmer initialized");

    // Start background tasks
    let cleanup_handle = spawn_cleanup_task(Arc::clone(&state.cache), config.cleanup_interval_secs);
    let retention_handle =
        spawn_retention_task(Arc::clone(&state.archiver), config.cycle_interval_secs);
    let cancel_handle = state.archiver.cancel_handle();
    info!("Background sweep and retention tasks started");

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(
            cleanup_handle,
            retention_handle,
            cancel_handle,
        ))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, cancels any in-flight retention cycle between
/// records and aborts the background tasks.
async fn shutdown_signal(
    cleanup_handle: tokio::task::JoinHandle<()>,
    retention_handle: tokio::task::JoinHandle<()>,
    cancel_handle: CancelHandle,
) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Let an in-flight cycle finish its current record, then stop.
    cancel_handle.cancel();
    cleanup_handle.abort();
    retention_handle.abort();
    warn!("Background tasks stopped");
}
