//! hetero-inventory server entry point.
//!
//! Starts the Axum HTTP server with the REST API and the browser UI.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use hetero_inventory::api;
use hetero_inventory::app_state::AppState;
use hetero_inventory::config::AppConfig;
use hetero_inventory::domain::Topology;
use hetero_inventory::persistence::{ItemStore, MemoryItemStore, PostgresItemStore};
use hetero_inventory::service::InventoryService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let topology = Topology::detect(&config.placement);
    tracing::info!(
        addr = %config.listen_addr,
        machine = %topology.machine,
        node = %topology.node_name,
        persistence = config.persistence_enabled,
        "starting hetero-inventory"
    );

    // Build persistence layer
    let store: Arc<dyn ItemStore> = if config.persistence_enabled {
        Arc::new(PostgresItemStore::connect_lazy(&config)?)
    } else {
        tracing::warn!("persistence disabled; items are kept in memory");
        Arc::new(MemoryItemStore::new())
    };

    let inventory = Arc::new(InventoryService::new(store));

    // Build application state
    let app_state = AppState {
        inventory: Arc::clone(&inventory),
        topology: Arc::new(topology),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    };

    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    // Schema init runs behind the listener; until it succeeds /ready
    // answers 503 and the UI shows the database as disconnected.
    inventory.initialize_in_background(
        config.database_connect_retries,
        Duration::from_secs(config.database_retry_delay_secs),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM from the kubelet.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
