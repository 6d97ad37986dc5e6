//! Database schema definitions for heirloom-ingest
//!
//! Schema definitions here are the single source of truth; missing
//! tables and columns are created at startup by the schema sync. The
//! artifact writer still carries a narrow runtime fallback for databases
//! this service does not administer (see `db::artifacts`).

use heirloom_common::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use heirloom_common::Result;
use sqlx::SqlitePool;

/// Collections table: named, owned groupings of artifacts
pub struct CollectionsTableSchema;

impl TableSchema for CollectionsTableSchema {
    fn table_name() -> &'static str {
        "collections"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("slug", "TEXT"),
            ColumnDefinition::new("title", "TEXT").not_null().default("''"),
            ColumnDefinition::new("description", "TEXT"),
            ColumnDefinition::new("cover_url", "TEXT"),
            ColumnDefinition::new("owner_id", "TEXT").not_null().default("''"),
            ColumnDefinition::new("is_public", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("created_at", "TEXT").not_null().default("''"),
        ]
    }
}

/// Artifacts table: normalized columns plus the JSON payload mirror
pub struct ArtifactsTableSchema;

impl TableSchema for ArtifactsTableSchema {
    fn table_name() -> &'static str {
        "artifacts"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "TEXT").primary_key(),
            ColumnDefinition::new("slug", "TEXT").not_null().default("''"),
            ColumnDefinition::new("title", "TEXT").not_null().default("''"),
            ColumnDefinition::new("summary", "TEXT").not_null().default("''"),
            ColumnDefinition::new("owner_id", "TEXT").not_null().default("''"),
            ColumnDefinition::new("collection_id", "TEXT"),
            // Full record mirror: media, transcript, tags, theme, privacy
            ColumnDefinition::new("payload", "TEXT").not_null().default("'{}'"),
            ColumnDefinition::new("created_at", "TEXT").not_null().default("''"),
        ]
    }
}

/// Sessions table: written by the external identity flow, read here
pub struct SessionsTableSchema;

impl TableSchema for SessionsTableSchema {
    fn table_name() -> &'static str {
        "sessions"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("token", "TEXT").primary_key(),
            ColumnDefinition::new("user_id", "TEXT").not_null().default("''"),
            ColumnDefinition::new("created_at", "TEXT").not_null().default("''"),
            ColumnDefinition::new("expires_at", "TEXT"),
        ]
    }
}

/// Synchronize every table this service touches
pub async fn sync_all(pool: &SqlitePool) -> Result<()> {
    SchemaSync::sync_table::<CollectionsTableSchema>(pool).await?;
    SchemaSync::sync_table::<ArtifactsTableSchema>(pool).await?;
    SchemaSync::sync_table::<SessionsTableSchema>(pool).await?;
    Ok(())
}
