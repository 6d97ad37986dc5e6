//! Collection API handlers
//!
//! POST /collections (create), GET /collections (list visible),
//! GET /collections/{reference} (fetch by id or slug).

use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use chrono::Utc;
use heirloom_common::{ids, slug};
use serde::Serialize;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::Collection;
use crate::{db, AppState};

/// POST /collections response
#[derive(Debug, Serialize)]
pub struct CreateCollectionResponse {
    pub id: Uuid,
    pub slug: String,
}

/// POST /collections
///
/// Multipart fields: `title` (required), `description`, `is_public`,
/// and an optional `cover` image uploaded to the media host.
pub async fn create_collection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<Json<CreateCollectionResponse>> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut is_public = false;
    let mut cover: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("title") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                let value = value.trim().to_string();
                if !value.is_empty() {
                    title = Some(value);
                }
            }
            Some("description") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                let value = value.trim().to_string();
                if !value.is_empty() {
                    description = Some(value);
                }
            }
            Some("is_public") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                is_public = matches!(value.trim(), "true" | "1" | "on");
            }
            Some("cover") => {
                let filename = field.file_name().unwrap_or("cover").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec();
                if !bytes.is_empty() {
                    cover = Some((filename, bytes));
                }
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| ApiError::BadRequest("title is required".to_string()))?;

    // Cover upload is best-effort: a failure leaves the collection
    // without a cover rather than failing creation
    let mut cover_url = None;
    if let (Some((filename, bytes)), Some(client)) = (cover, &state.clients.media_host) {
        match client.upload(&filename, bytes).await {
            Ok(media) => cover_url = Some(media.url),
            Err(err) => {
                tracing::warn!(error = %err, "Cover upload failed, creating collection without cover");
            }
        }
    }

    let collection = Collection {
        id: ids::generate(),
        slug: Some(slug::slug_or_random(&title, "collection")),
        title,
        description,
        cover_url,
        owner_id: user.user_id,
        is_public,
        created_at: Utc::now(),
    };

    db::collections::insert_collection(&state.db, &collection).await?;

    tracing::info!(collection_id = %collection.id, "Collection created");

    Ok(Json(CreateCollectionResponse {
        id: collection.id,
        // Always present on newly created collections
        slug: collection.slug.unwrap_or_default(),
    }))
}

/// GET /collections
///
/// Lists the caller's collections plus public ones.
pub async fn list_collections(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Collection>>> {
    let collections = db::collections::list_visible(&state.db, &user.user_id).await?;
    Ok(Json(collections))
}

/// GET /collections/{reference}
///
/// Fetch one collection by canonical identifier or slug. Private
/// collections are visible to their owner only.
pub async fn get_collection(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(reference): Path<String>,
) -> ApiResult<Json<Collection>> {
    let collection = db::collections::fetch_collection(&state.db, &reference)
        .await?
        .filter(|c| c.is_public || c.owner_id == user.user_id)
        .ok_or_else(|| ApiError::NotFound(format!("Collection not found: {}", reference)))?;

    Ok(Json(collection))
}
