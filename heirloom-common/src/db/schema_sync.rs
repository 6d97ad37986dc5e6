//! Automatic schema synchronization
//!
//! Declarative schema maintenance: each table's expected columns are
//! defined in code, and missing columns are added via `ALTER TABLE ADD
//! COLUMN` at service startup. This keeps long-lived deployment databases
//! current without hand-written migrations for simple column additions.
//!
//! Initialization order per table:
//! 1. `CREATE TABLE IF NOT EXISTS` (service's `db::init_tables`)
//! 2. Auto-sync missing columns (this module)
//!
//! Type or constraint changes cannot be fixed automatically in SQLite and
//! are logged for manual migration.

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g. "TEXT", "INTEGER", "REAL")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// DEFAULT value
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    /// Mark column as PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set DEFAULT value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Render the column clause for CREATE TABLE
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }
}

/// Defines expected schema for a database table
pub trait TableSchema {
    /// Table name in database
    fn table_name() -> &'static str;

    /// Expected column definitions (order matters for new table creation)
    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Schema synchronization: introspect, diff, and apply column additions
pub struct SchemaSync;

impl SchemaSync {
    /// Synchronize one table's schema with its declared definition.
    ///
    /// Adds missing columns via `ALTER TABLE ADD COLUMN`. Creates the
    /// table outright when it does not exist yet.
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
        let table = T::table_name();
        let expected = T::expected_columns();

        if !Self::table_exists(pool, table).await? {
            Self::create_table(pool, table, &expected).await?;
            return Ok(());
        }

        let actual = Self::actual_columns(pool, table).await?;

        let mut added = 0;
        for column in &expected {
            if actual.iter().any(|name| name == &column.name) {
                continue;
            }
            Self::add_column(pool, table, column).await?;
            added += 1;
        }

        if added > 0 {
            info!(table, added, "Schema sync: added missing columns");
        }

        Ok(())
    }

    /// Check if table exists
    pub async fn table_exists(pool: &SqlitePool, table: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type = 'table' AND name = ?
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Read actual column names via PRAGMA table_info
    pub async fn actual_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
        let query = format!("PRAGMA table_info({})", table);
        let rows = sqlx::query(&query).fetch_all(pool).await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    async fn create_table(
        pool: &SqlitePool,
        table: &str,
        columns: &[ColumnDefinition],
    ) -> Result<()> {
        let clauses: Vec<String> = columns.iter().map(ColumnDefinition::to_sql).collect();
        let sql = format!("CREATE TABLE IF NOT EXISTS {} ({})", table, clauses.join(", "));
        sqlx::query(&sql).execute(pool).await?;
        info!(table, "Schema sync: created table");
        Ok(())
    }

    /// Add a missing column via ALTER TABLE ADD COLUMN.
    ///
    /// SQLite cannot add a PRIMARY KEY column, and a NOT NULL column
    /// requires a DEFAULT; both limitations are logged and skipped rather
    /// than failing startup.
    async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
        if column.primary_key {
            warn!(
                table,
                column = %column.name,
                "Schema sync: cannot add PRIMARY KEY column, manual migration required"
            );
            return Ok(());
        }
        if column.not_null && column.default_value.is_none() {
            warn!(
                table,
                column = %column.name,
                "Schema sync: cannot add NOT NULL column without DEFAULT, manual migration required"
            );
            return Ok(());
        }

        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, column.name, column.sql_type
        );
        if column.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }

        sqlx::query(&sql).execute(pool).await?;
        info!(table, column = %column.name, "Schema sync: added column");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WidgetsSchema;

    impl TableSchema for WidgetsSchema {
        fn table_name() -> &'static str {
            "widgets"
        }

        fn expected_columns() -> Vec<ColumnDefinition> {
            vec![
                ColumnDefinition::new("id", "TEXT").primary_key(),
                ColumnDefinition::new("name", "TEXT").not_null().default("''"),
                ColumnDefinition::new("weight", "REAL"),
            ]
        }
    }

    async fn test_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:")
            .await
            .expect("in-memory pool")
    }

    #[tokio::test]
    async fn test_creates_missing_table() {
        let pool = test_pool().await;
        SchemaSync::sync_table::<WidgetsSchema>(&pool).await.unwrap();

        assert!(SchemaSync::table_exists(&pool, "widgets").await.unwrap());
        let columns = SchemaSync::actual_columns(&pool, "widgets").await.unwrap();
        assert_eq!(columns, vec!["id", "name", "weight"]);
    }

    #[tokio::test]
    async fn test_adds_missing_columns() {
        let pool = test_pool().await;
        sqlx::query("CREATE TABLE widgets (id TEXT PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();

        SchemaSync::sync_table::<WidgetsSchema>(&pool).await.unwrap();

        let columns = SchemaSync::actual_columns(&pool, "widgets").await.unwrap();
        assert!(columns.contains(&"name".to_string()));
        assert!(columns.contains(&"weight".to_string()));
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let pool = test_pool().await;
        SchemaSync::sync_table::<WidgetsSchema>(&pool).await.unwrap();
        SchemaSync::sync_table::<WidgetsSchema>(&pool).await.unwrap();

        let columns = SchemaSync::actual_columns(&pool, "widgets").await.unwrap();
        assert_eq!(columns.len(), 3);
    }
}
