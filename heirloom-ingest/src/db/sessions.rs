//! Session store access
//!
//! Sessions are minted by the external identity flow after OAuth
//! sign-in; this service reads them to authenticate requests. The write
//! helper exists for the session-issuing callback and for tests.

use chrono::{DateTime, Utc};
use heirloom_common::{Error, Result};
use sqlx::{Row, SqlitePool};

/// Resolve a session token to its user identifier.
///
/// Returns `None` for unknown or expired tokens.
pub async fn find_user_by_token(pool: &SqlitePool, token: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let expires_at: Option<String> = row.try_get("expires_at").map_err(Error::Database)?;
    if let Some(raw) = expires_at {
        let expires_at = chrono::DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| Error::Internal(format!("Failed to parse expires_at: {}", e)))?
            .with_timezone(&Utc);
        if expires_at <= Utc::now() {
            return Ok(None);
        }
    }

    let user_id: String = row.try_get("user_id").map_err(Error::Database)?;
    Ok(Some(user_id))
}

/// Record a session token for a user
pub async fn insert_session(
    pool: &SqlitePool,
    token: &str,
    user_id: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token)
    .bind(user_id)
    .bind(Utc::now().to_rfc3339())
    .bind(expires_at.map(|dt| dt.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_token_round_trip() {
        let pool = db::init_memory_pool().await.unwrap();
        db::schema::sync_all(&pool).await.unwrap();

        insert_session(&pool, "tok-1", "user-1", None).await.unwrap();

        let user = find_user_by_token(&pool, "tok-1").await.unwrap();
        assert_eq!(user.as_deref(), Some("user-1"));

        let missing = find_user_by_token(&pool, "tok-2").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let pool = db::init_memory_pool().await.unwrap();
        db::schema::sync_all(&pool).await.unwrap();

        let yesterday = Utc::now() - Duration::days(1);
        insert_session(&pool, "tok-old", "user-1", Some(yesterday))
            .await
            .unwrap();

        let user = find_user_by_token(&pool, "tok-old").await.unwrap();
        assert!(user.is_none());
    }
}
