//! Ingestion API handler
//!
//! POST /ingest: multipart form with `text`, zero or more `images`
//! parts, an optional `audio` part, and a collection reference under any
//! of its aliased field names.

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{Submission, UploadFile};
use crate::{pipeline, AppState};

/// POST /ingest response
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub id: Uuid,
    pub slug: String,
    pub collection_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// POST /ingest
///
/// Runs one submission through the ingestion pipeline. Degraded steps
/// (skipped upload, missing transcript, fallback summary) still return
/// 200 and surface through `warning`; only an unrecoverable write
/// returns an error.
pub async fn ingest(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Json<IngestResponse>> {
    let submission = parse_submission(multipart).await?;

    let outcome = match pipeline::run(&state, &user.user_id, submission).await {
        Ok(outcome) => outcome,
        Err(err) => {
            *state.last_error.write().await = Some(err.to_string());
            return Err(err);
        }
    };

    tracing::info!(
        artifact_id = %outcome.artifact_id,
        slug = %outcome.slug,
        owner_id = %user.user_id,
        "Artifact ingested"
    );

    Ok(Json(IngestResponse {
        id: outcome.artifact_id,
        slug: outcome.slug,
        collection_id: outcome.collection_id,
        warning: outcome.warning,
    }))
}

/// Parse the multipart form into a submission.
///
/// Unknown fields are ignored. The collection reference is accepted
/// under `collectionId`, `collection_id`, or `collection`; the first
/// non-empty value wins.
async fn parse_submission(mut multipart: Multipart) -> ApiResult<Submission> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("text") => {
                submission.text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
            }
            Some("images") => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec();
                // Empty file parts (e.g. an unfilled form input) are dropped
                if !bytes.is_empty() {
                    submission.images.push(UploadFile { filename, bytes });
                }
            }
            Some("audio") => {
                let filename = field.file_name().unwrap_or("audio").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec();
                if !bytes.is_empty() {
                    submission.audio = Some(UploadFile { filename, bytes });
                }
            }
            Some("collectionId") | Some("collection_id") | Some("collection") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
                let value = value.trim();
                if !value.is_empty() && submission.collection_ref.is_none() {
                    submission.collection_ref = Some(value.to_string());
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    Ok(submission)
}
