//! ttl_gate - In-memory TTL caches and fixed-window rate limiters
//!
//! Serves the inspection API over the process-wide registry.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_gate::api::{create_router, AppState};
use ttl_gate::{Config, Registry};

/// Main entry point for the ttl_gate server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build every domain cache and preset limiter
/// 4. Start background sweeps
/// 5. Serve the HTTP API on the configured port
/// 6. Stop the sweeps on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_gate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ttl_gate");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        cleanup_interval_ms = config.cleanup_interval_ms,
        limiter_cleanup_interval_ms = config.limiter_cleanup_interval_ms,
        "Configuration loaded"
    );

    let mut registry = Registry::from_config(&config).context("invalid cache configuration")?;
    registry.start_cleanup();
    let registry = Arc::new(registry);

    let app = create_router(AppState::from_shared(Arc::clone(&registry)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then stops the registry's sweeps.
async fn shutdown_signal(registry: Arc<Registry>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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

    registry.shutdown();
    warn!("Cleanup tasks stopped");
}
