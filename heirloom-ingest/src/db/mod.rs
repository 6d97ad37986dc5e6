//! Database access for heirloom-ingest

pub mod artifacts;
pub mod collections;
pub mod schema;
pub mod sessions;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool.
///
/// Opens (or creates) the database file and synchronizes every table
/// against its declared schema, so deployment databases pick up new
/// columns at startup rather than at first write.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    schema::sync_all(&pool).await?;

    Ok(pool)
}

/// In-memory pool for tests.
///
/// Pinned to a single connection: each SQLite `:memory:` connection is
/// its own database, so a multi-connection pool would scatter tables.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}
