//! Artifact store access
//!
//! The insert adapts to the live schema: when the database reports an
//! undefined column for one of the optional columns, the insert retries
//! with that column removed and relies on the JSON payload mirror to
//! carry the equivalent value. Adaptation is bounded; the final error
//! surfaces if every attempt fails. Deployment databases administered by
//! this service never take that path (startup schema sync adds missing
//! columns), but databases shared with older service versions can.

use crate::models::{Artifact, ArtifactPayload};
use heirloom_common::db::retry_on_lock;
use heirloom_common::{ids, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

/// Upper bound on schema-adaptation insert attempts
const MAX_INSERT_ATTEMPTS: usize = 3;
/// Columns the insert may drop when the live schema lacks them; each has
/// an equivalent value embedded in the payload mirror
const OPTIONAL_COLUMNS: &[&str] = &["collection_id"];
/// Max total wait for lock-contention retries per statement
const LOCK_WAIT_MS: u64 = 2000;

/// What the adaptive insert ended up doing
#[derive(Debug, Default)]
pub struct InsertOutcome {
    /// Optional columns dropped to satisfy the live schema
    pub dropped_columns: Vec<&'static str>,
}

/// Persist one artifact, adapting the column set to the live schema
pub async fn insert_artifact(pool: &SqlitePool, artifact: &Artifact) -> Result<InsertOutcome> {
    let payload = serde_json::to_string(&artifact.payload)
        .map_err(|e| Error::Internal(format!("Failed to serialize payload: {}", e)))?;
    let created_at = artifact.created_at.to_rfc3339();

    let mut dropped: Vec<&'static str> = Vec::new();

    for _ in 0..MAX_INSERT_ATTEMPTS {
        let result = retry_on_lock("insert_artifact", LOCK_WAIT_MS, || {
            try_insert(pool, artifact, &payload, &created_at, &dropped)
        })
        .await;

        match result {
            Ok(()) => {
                return Ok(InsertOutcome {
                    dropped_columns: dropped,
                })
            }
            Err(err) => {
                let droppable = undefined_column(&err).and_then(|name| {
                    OPTIONAL_COLUMNS
                        .iter()
                        .copied()
                        .find(|col| *col == name && !dropped.contains(col))
                });
                match droppable {
                    Some(column) => {
                        warn!(
                            column,
                            "Insert hit undefined column, retrying with reduced payload"
                        );
                        dropped.push(column);
                    }
                    None => return Err(err),
                }
            }
        }
    }

    Err(Error::Internal(
        "Artifact insert exhausted schema-adaptation attempts".to_string(),
    ))
}

async fn try_insert(
    pool: &SqlitePool,
    artifact: &Artifact,
    payload: &str,
    created_at: &str,
    dropped: &[&'static str],
) -> Result<()> {
    let collection_id = artifact
        .collection_id
        .filter(|_| !dropped.contains(&"collection_id"))
        .map(|id| id.to_string());

    let mut columns = vec!["id", "slug", "title", "summary", "owner_id"];
    if collection_id.is_some() {
        columns.push("collection_id");
    }
    columns.push("payload");
    columns.push("created_at");

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO artifacts ({}) VALUES ({})",
        columns.join(", "),
        placeholders
    );

    let mut query = sqlx::query(&sql)
        .bind(artifact.id.to_string())
        .bind(&artifact.slug)
        .bind(&artifact.title)
        .bind(&artifact.summary)
        .bind(&artifact.owner_id);
    if let Some(collection_id) = &collection_id {
        query = query.bind(collection_id.clone());
    }
    query = query.bind(payload).bind(created_at);

    query.execute(pool).await.map_err(Error::Database)?;
    Ok(())
}

/// Set the top-level collection column when the insert did not persist it.
///
/// Called after every insert that resolved a collection reference. A row
/// whose column is already set needs nothing; a null or unreadable column
/// (dropped at insert time, or silently discarded by a row-security
/// policy) gets one update attempt. Errors propagate so the caller can
/// downgrade them to a warning; the payload mirror remains authoritative
/// for display either way.
pub async fn reconcile_collection(
    pool: &SqlitePool,
    artifact_id: Uuid,
    collection_id: Uuid,
) -> Result<()> {
    let current: std::result::Result<Option<String>, sqlx::Error> =
        sqlx::query_scalar("SELECT collection_id FROM artifacts WHERE id = ?")
            .bind(artifact_id.to_string())
            .fetch_one(pool)
            .await;

    match current {
        Ok(Some(_)) => return Ok(()),
        Ok(None) => {}
        // Column may not exist on this schema; the update below settles it
        Err(_) => {}
    }

    sqlx::query("UPDATE artifacts SET collection_id = ? WHERE id = ?")
        .bind(collection_id.to_string())
        .bind(artifact_id.to_string())
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    Ok(())
}

/// Fetch one artifact by canonical identifier or slug.
///
/// Slug collisions are possible (uniqueness is not enforced); a slug
/// lookup returns the most recently created match.
pub async fn fetch_artifact(pool: &SqlitePool, reference: &str) -> Result<Option<Artifact>> {
    let row = if ids::is_canonical(reference) {
        sqlx::query("SELECT * FROM artifacts WHERE id = ?")
            .bind(reference)
            .fetch_optional(pool)
            .await?
    } else {
        sqlx::query("SELECT * FROM artifacts WHERE slug = ? ORDER BY created_at DESC LIMIT 1")
            .bind(reference)
            .fetch_optional(pool)
            .await?
    };

    row.as_ref().map(row_to_artifact).transpose()
}

fn row_to_artifact(row: &SqliteRow) -> Result<Artifact> {
    let payload_raw: String = row.try_get("payload").map_err(Error::Database)?;
    let payload: ArtifactPayload = serde_json::from_str(&payload_raw)
        .map_err(|e| Error::Internal(format!("Failed to deserialize payload: {}", e)))?;

    let id: String = row.try_get("id").map_err(Error::Database)?;
    let id = ids::parse(&id)
        .map_err(|e| Error::Internal(format!("Malformed artifact id: {}", e)))?;

    // The top-level column wins when present; older schemas (or rows from
    // the degraded insert path) fall back to the payload mirror.
    let collection_id = match row.try_get::<Option<String>, _>("collection_id") {
        Ok(Some(raw)) => ids::parse(&raw).ok(),
        Ok(None) => payload.collection_id,
        Err(_) => payload.collection_id,
    };

    let created_at: String = row.try_get("created_at").map_err(Error::Database)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    Ok(Artifact {
        id,
        slug: row.try_get("slug").map_err(Error::Database)?,
        title: row.try_get("title").map_err(Error::Database)?,
        summary: row.try_get("summary").map_err(Error::Database)?,
        owner_id: row.try_get("owner_id").map_err(Error::Database)?,
        collection_id,
        payload,
        created_at,
    })
}

/// Extract the column name from an undefined-column error.
///
/// SQLite reports `table artifacts has no column named collection_id`
/// for inserts and `no such column: collection_id` for expressions.
fn undefined_column(err: &Error) -> Option<String> {
    let message = match err {
        Error::Database(db_err) => db_err.to_string(),
        _ => return None,
    };

    for marker in ["has no column named ", "no such column: "] {
        if let Some(pos) = message.find(marker) {
            let name: String = message[pos + marker.len()..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::MediaItem;
    use chrono::Utc;

    fn sample_artifact(collection_id: Option<Uuid>) -> Artifact {
        Artifact {
            id: ids::generate(),
            slug: "grandpa-s-watch".to_string(),
            title: "Grandpa's watch".to_string(),
            summary: "Generated from notes.".to_string(),
            owner_id: ids::generate().to_string(),
            collection_id,
            payload: ArtifactPayload {
                media: vec![MediaItem::image("https://cdn.example.com/watch.jpg")],
                collection_id,
                ..Default::default()
            },
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let pool = db::init_memory_pool().await.unwrap();
        db::schema::sync_all(&pool).await.unwrap();

        let collection_id = ids::generate();
        let artifact = sample_artifact(Some(collection_id));

        let outcome = insert_artifact(&pool, &artifact).await.unwrap();
        assert!(outcome.dropped_columns.is_empty());

        let fetched = fetch_artifact(&pool, &artifact.id.to_string())
            .await
            .unwrap()
            .expect("artifact should exist");
        assert_eq!(fetched.title, "Grandpa's watch");
        assert_eq!(fetched.collection_id, Some(collection_id));
        assert_eq!(fetched.payload.media.len(), 1);

        // Slug lookup finds the same row
        let by_slug = fetch_artifact(&pool, "grandpa-s-watch").await.unwrap();
        assert_eq!(by_slug.unwrap().id, artifact.id);
    }

    #[tokio::test]
    async fn test_insert_adapts_to_missing_collection_column() {
        let pool = db::init_memory_pool().await.unwrap();
        // Deliberately drifted schema: no collection_id column
        sqlx::query(
            "CREATE TABLE artifacts (
                id TEXT PRIMARY KEY, slug TEXT NOT NULL, title TEXT NOT NULL,
                summary TEXT NOT NULL, owner_id TEXT NOT NULL,
                payload TEXT NOT NULL, created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        let collection_id = ids::generate();
        let artifact = sample_artifact(Some(collection_id));

        let outcome = insert_artifact(&pool, &artifact).await.unwrap();
        assert_eq!(outcome.dropped_columns, vec!["collection_id"]);

        // The payload mirror keeps the association readable
        let fetched = fetch_artifact(&pool, &artifact.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.collection_id, Some(collection_id));

        // Reconciliation cannot succeed on this schema; the error is the
        // caller's cue to warn rather than fail
        assert!(reconcile_collection(&pool, artifact.id, collection_id)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_reconcile_backfills_null_column() {
        let pool = db::init_memory_pool().await.unwrap();
        db::schema::sync_all(&pool).await.unwrap();

        let collection_id = ids::generate();
        let mut artifact = sample_artifact(Some(collection_id));
        // Simulate the inconsistency window: column null, mirror set
        artifact.collection_id = None;
        artifact.payload.collection_id = Some(collection_id);
        insert_artifact(&pool, &artifact).await.unwrap();

        reconcile_collection(&pool, artifact.id, collection_id)
            .await
            .unwrap();

        let persisted: Option<String> =
            sqlx::query_scalar("SELECT collection_id FROM artifacts WHERE id = ?")
                .bind(artifact.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(persisted, Some(collection_id.to_string()));
    }

    #[tokio::test]
    async fn test_unknown_undefined_column_is_fatal() {
        let pool = db::init_memory_pool().await.unwrap();
        // Schema missing a required (non-droppable) column
        sqlx::query(
            "CREATE TABLE artifacts (
                id TEXT PRIMARY KEY, slug TEXT NOT NULL, title TEXT NOT NULL,
                summary TEXT NOT NULL, owner_id TEXT NOT NULL, collection_id TEXT,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        let artifact = sample_artifact(None);
        let result = insert_artifact(&pool, &artifact).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_undefined_column_parser() {
        assert_eq!(
            undefined_column(&Error::Database(sqlx::Error::Protocol(
                "table artifacts has no column named collection_id".to_string()
            ))),
            Some("collection_id".to_string())
        );
        assert_eq!(
            undefined_column(&Error::Database(sqlx::Error::Protocol(
                "no such column: slug".to_string()
            ))),
            Some("slug".to_string())
        );
        assert_eq!(
            undefined_column(&Error::Internal("not a database error".to_string())),
            None
        );
    }
}
