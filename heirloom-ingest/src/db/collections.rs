//! Collection store access
//!
//! Includes the collection-reference normalizer: client-supplied
//! references arrive either as canonical identifiers or as
//! human-readable slugs, and the pipeline only ever works with the
//! canonical form.

use crate::models::Collection;
use heirloom_common::db::retry_on_lock;
use heirloom_common::{ids, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const LOCK_WAIT_MS: u64 = 2000;

/// Resolve a collection reference to a canonical identifier.
///
/// A reference already in canonical format is accepted as-is; this is a
/// format check only, not an existence lookup. Anything else is treated
/// as a slug and resolved against the store. `Ok(None)` signals
/// resolution failure, which callers treat as non-fatal (the artifact
/// lands uncategorized, with a warning).
pub async fn resolve_collection_ref(
    pool: &SqlitePool,
    reference: &str,
) -> Result<Option<Uuid>> {
    if let Ok(id) = ids::parse(reference) {
        return Ok(Some(id));
    }
    find_id_by_slug(pool, reference).await
}

/// Look up a collection's canonical identifier by slug.
///
/// Slug uniqueness is best-effort; on collision the most recently
/// created collection wins.
pub async fn find_id_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Uuid>> {
    let id: Option<String> = sqlx::query_scalar(
        "SELECT id FROM collections WHERE slug = ? ORDER BY created_at DESC LIMIT 1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    id.map(|raw| {
        ids::parse(&raw).map_err(|e| Error::Internal(format!("Malformed collection id: {}", e)))
    })
    .transpose()
}

/// Persist a new collection
pub async fn insert_collection(pool: &SqlitePool, collection: &Collection) -> Result<()> {
    let id = collection.id.to_string();
    let created_at = collection.created_at.to_rfc3339();

    retry_on_lock("insert_collection", LOCK_WAIT_MS, || async {
        sqlx::query(
            r#"
            INSERT INTO collections (
                id, slug, title, description, cover_url, owner_id, is_public, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&collection.slug)
        .bind(&collection.title)
        .bind(&collection.description)
        .bind(&collection.cover_url)
        .bind(&collection.owner_id)
        .bind(collection.is_public as i64)
        .bind(&created_at)
        .execute(pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    })
    .await
}

/// Fetch one collection by canonical identifier or slug
pub async fn fetch_collection(pool: &SqlitePool, reference: &str) -> Result<Option<Collection>> {
    let row = if ids::is_canonical(reference) {
        sqlx::query("SELECT * FROM collections WHERE id = ?")
            .bind(reference)
            .fetch_optional(pool)
            .await?
    } else {
        sqlx::query("SELECT * FROM collections WHERE slug = ? ORDER BY created_at DESC LIMIT 1")
            .bind(reference)
            .fetch_optional(pool)
            .await?
    };

    row.as_ref().map(row_to_collection).transpose()
}

/// List the collections visible to a user: their own plus public ones
pub async fn list_visible(pool: &SqlitePool, user_id: &str) -> Result<Vec<Collection>> {
    let rows = sqlx::query(
        "SELECT * FROM collections WHERE owner_id = ? OR is_public = 1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_collection).collect()
}

fn row_to_collection(row: &SqliteRow) -> Result<Collection> {
    let id: String = row.try_get("id").map_err(Error::Database)?;
    let id = ids::parse(&id)
        .map_err(|e| Error::Internal(format!("Malformed collection id: {}", e)))?;

    let created_at: String = row.try_get("created_at").map_err(Error::Database)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&chrono::Utc);

    Ok(Collection {
        id,
        slug: row.try_get("slug").map_err(Error::Database)?,
        title: row.try_get("title").map_err(Error::Database)?,
        description: row.try_get("description").map_err(Error::Database)?,
        cover_url: row.try_get("cover_url").map_err(Error::Database)?,
        owner_id: row.try_get("owner_id").map_err(Error::Database)?,
        is_public: row.try_get::<i64, _>("is_public").map_err(Error::Database)? != 0,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::Utc;

    fn sample_collection(slug: &str) -> Collection {
        Collection {
            id: ids::generate(),
            slug: Some(slug.to_string()),
            title: "Family Watches".to_string(),
            description: None,
            cover_url: None,
            owner_id: ids::generate().to_string(),
            is_public: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_canonical_reference_skips_store_lookup() {
        // No tables exist in this pool; a store lookup would error out
        let pool = db::init_memory_pool().await.unwrap();

        let id = ids::generate();
        let resolved = resolve_collection_ref(&pool, &id.to_string())
            .await
            .unwrap();
        assert_eq!(resolved, Some(id));
    }

    #[tokio::test]
    async fn test_slug_resolves_to_canonical_id() {
        let pool = db::init_memory_pool().await.unwrap();
        db::schema::sync_all(&pool).await.unwrap();

        let collection = sample_collection("family-watches");
        insert_collection(&pool, &collection).await.unwrap();

        let resolved = resolve_collection_ref(&pool, "family-watches")
            .await
            .unwrap();
        assert_eq!(resolved, Some(collection.id));
    }

    #[tokio::test]
    async fn test_unknown_slug_resolves_to_none() {
        let pool = db::init_memory_pool().await.unwrap();
        db::schema::sync_all(&pool).await.unwrap();

        let resolved = resolve_collection_ref(&pool, "no-such-collection")
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_fetch_by_id_and_slug() {
        let pool = db::init_memory_pool().await.unwrap();
        db::schema::sync_all(&pool).await.unwrap();

        let collection = sample_collection("family-watches");
        insert_collection(&pool, &collection).await.unwrap();

        let by_id = fetch_collection(&pool, &collection.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.title, "Family Watches");

        let by_slug = fetch_collection(&pool, "family-watches")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.id, collection.id);
    }
}
