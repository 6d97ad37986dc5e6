//! heirloom-ingest library interface
//!
//! Exposes the application state and router for the binary and for
//! integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

pub use crate::error::{ApiError, ApiResult};
pub use crate::services::ProviderClients;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Upper bound on one multipart submission (photos plus a voice note)
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// External provider clients, constructed at startup
    pub clients: ProviderClients,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, clients: ProviderClients) -> Self {
        Self {
            db,
            clients,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
///
/// Everything except /health sits behind the session-auth middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let protected = Router::new()
        .route("/ingest", post(api::ingest::ingest))
        .route(
            "/collections",
            post(api::collections::create_collection).get(api::collections::list_collections),
        )
        .route("/collections/:reference", get(api::collections::get_collection))
        .route("/artifacts/:reference", get(api::artifacts::get_artifact))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
