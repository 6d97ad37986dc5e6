//! Artifact API handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{Artifact, MediaItem};
use crate::{db, AppState};

/// GET /artifacts/{reference} response
#[derive(Debug, Serialize)]
pub struct ArtifactResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub media: Vec<MediaItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub collection_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Artifact> for ArtifactResponse {
    fn from(artifact: Artifact) -> Self {
        Self {
            id: artifact.id,
            slug: artifact.slug,
            title: artifact.title,
            summary: artifact.summary,
            media: artifact.payload.media,
            transcript: artifact.payload.transcript,
            collection_id: artifact.collection_id,
            created_at: artifact.created_at,
        }
    }
}

/// GET /artifacts/{reference}
///
/// Fetch one artifact by canonical identifier or slug. Visible to its
/// owner, or to anyone when it sits in a public collection.
pub async fn get_artifact(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(reference): Path<String>,
) -> ApiResult<Json<ArtifactResponse>> {
    let artifact = db::artifacts::fetch_artifact(&state.db, &reference)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Artifact not found: {}", reference)))?;

    if artifact.owner_id != user.user_id {
        let in_public_collection = match artifact.collection_id {
            Some(collection_id) => {
                db::collections::fetch_collection(&state.db, &collection_id.to_string())
                    .await?
                    .map(|c| c.is_public)
                    .unwrap_or(false)
            }
            None => false,
        };
        if !in_public_collection {
            // Not-found rather than forbidden: do not leak existence
            return Err(ApiError::NotFound(format!(
                "Artifact not found: {}",
                reference
            )));
        }
    }

    Ok(Json(artifact.into()))
}
