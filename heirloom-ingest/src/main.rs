//! heirloom-ingest - Artifact Ingestion Service
//!
//! Turns authenticated submissions (photos, an optional voice note, and
//! free-text notes) into persisted artifact records with a generated
//! title, summary, and media gallery, organized into collections.
//!
//! Thin orchestration over three external collaborators (object host,
//! speech-to-text, text generation) in front of a SQLite store.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use heirloom_ingest::config::ServiceConfig;
use heirloom_ingest::{AppState, ProviderClients};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting heirloom-ingest (Artifact Ingestion) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration (ENV -> TOML -> defaults)
    let config = ServiceConfig::resolve()
        .map_err(|e| anyhow::anyhow!("Failed to resolve configuration: {}", e))?;
    info!("Database: {}", config.database_path.display());

    // Open or create database, sync table schemas
    let db_pool = heirloom_ingest::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    // Construct provider clients; unconfigured providers degrade their
    // pipeline stages instead of blocking startup
    let clients = ProviderClients::from_config(&config);

    // Create application state and router
    let state = AppState::new(db_pool, clients);
    let app = heirloom_ingest::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
