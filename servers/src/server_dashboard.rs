//! # FG Stock Dashboard Server
//!
//! Hosts the real-time engine behind a small JSON API for the finished-goods
//! stock dashboard.
//!
//! ## Core Responsibilities:
//! - **Live Feed:** Builds the `RealtimeEngine` over the mock dataset, attaches a
//!   `DashboardAggregator`, and connects it on start-up.
//! - **HTTP API:** Serves the health check, the aggregated dashboard state and
//!   the static grids and charts with permissive CORS.
//! - **Lifecycle:** Shuts the HTTP listener down gracefully on `CTRL+C` or
//!   `SIGTERM`, then tears the engine down.

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;

use lib_fgstock::core::{DashboardAggregator, RealtimeEngine};
use lib_fgstock::datasets::{DashboardDataSource, MockDataset};
use lib_fgstock::models::ConnectionStatus;

mod dashboard_logic;
use dashboard_logic::{config, logger, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Phase 1: Configuration & Logging ---
    // `.env` first, so clap sees its variables.
    let _ = dotenvy::dotenv();
    let config = config::load_config();
    logger::setup_logging(&config.log_dir(), config.log_prefix(), config.log_level())?;
    log::info!("FG Stock Dashboard server booting with {:?}", config);

    // --- Phase 2: Engine ---
    let dataset: Arc<dyn DashboardDataSource> = Arc::new(MockDataset::new());
    let engine = RealtimeEngine::new(config.engine_config(), dataset.as_ref())?;
    let aggregator = DashboardAggregator::attach(&engine, dataset.as_ref());
    engine.subscribe_connection_status(|status| {
        if *status == ConnectionStatus::Disconnected {
            log::warn!("Live feed is disconnected");
        }
    });
    engine.connect();

    // --- Phase 3: Router ---
    let state = Arc::new(routes::AppState {
        engine,
        aggregator,
        dataset,
    });
    let app = routes::router(Arc::clone(&state));

    // --- Phase 4: Serve until a shutdown signal arrives ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Dashboard API live at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Phase 5: Teardown ---
    state.engine.teardown();
    log::info!("Shutdown complete.");
    Ok(())
}

/// # Graceful Shutdown Signal Handler
///
/// Resolves on the first `CTRL+C`, or `SIGTERM` on UNIX. A handler that cannot
/// be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Ctrl-C received, initiating shutdown."),
        _ = terminate => log::info!("SIGTERM received, initiating shutdown."),
    }
}
