//! Faultline collection service binary.
//!
//! Runs the HTTP API for report ingestion, querying, and resolution.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use faultline_server::api::{self, AppState};
use faultline_server::auditor::Auditor;
use faultline_server::config::ServerConfig;
use faultline_server::store::{AuditStore, MemoryStore, PostgresStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("faultline_server=info".parse()?),
        )
        .init();

    info!("Faultline collection service starting");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(listen_addr = %config.http.listen_addr, "Configuration loaded");

    // Connect the store. A failed database connection does not abort
    // startup: the collection endpoint keeps accepting records in memory
    // until the service is restarted against a reachable database.
    let store: Arc<dyn AuditStore> = match PostgresStore::new(&config.database).await {
        Ok(store) => {
            info!("Connected to PostgreSQL");
            Arc::new(store)
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to PostgreSQL, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let auditor = Arc::new(Auditor::new(
        Arc::clone(&store),
        config.audit.environment.clone(),
    ));

    let state = AppState { store, auditor };
    let app = api::router(state);

    // Start HTTP server
    let listener = TcpListener::bind(&config.http.listen_addr).await?;
    info!(addr = %config.http.listen_addr, "Collection API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
