//! Ingestion pipeline
//!
//! Sequences one submission through its stages:
//!
//! resolve collection → upload images → upload/transcribe audio →
//! structure content → derive slug → write artifact → reconcile
//!
//! Every stage before the write degrades on failure (skipped file,
//! absent transcript, fallback summary) instead of aborting; the
//! degradations surface only through the optional `warning` field of the
//! response. Authentication (handled before this runs) and an
//! unrecoverable write are the only fatal outcomes.

use crate::error::{ApiError, ApiResult};
use crate::models::{Artifact, ArtifactPayload, MediaItem, Submission};
use crate::services::structurer;
use crate::{db, AppState};
use chrono::Utc;
use heirloom_common::{ids, slug};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Pipeline stage, for logging and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    MediaUploading,
    Transcribing,
    Structuring,
    Slugging,
    Writing,
    Reconciling,
    Done,
}

/// Result of one successful ingestion
#[derive(Debug)]
pub struct IngestOutcome {
    pub artifact_id: Uuid,
    pub slug: String,
    pub collection_id: Option<Uuid>,
    pub warning: Option<String>,
}

/// Run the full pipeline for one authenticated submission
pub async fn run(
    state: &AppState,
    owner_id: &str,
    submission: Submission,
) -> ApiResult<IngestOutcome> {
    let mut warnings: Vec<String> = Vec::new();

    // Resolve the collection reference up front. Resolution failure is
    // non-fatal: the artifact lands uncategorized with a warning.
    let collection_id = match &submission.collection_ref {
        Some(reference) => {
            match db::collections::resolve_collection_ref(&state.db, reference).await {
                Ok(Some(id)) => Some(id),
                Ok(None) => {
                    warn!(reference = %reference, "Collection reference did not resolve");
                    warnings.push(format!(
                        "Collection '{}' not found; artifact saved uncategorized",
                        reference
                    ));
                    None
                }
                Err(err) => {
                    warn!(reference = %reference, error = %err, "Collection lookup failed");
                    warnings.push(format!(
                        "Collection '{}' could not be resolved; artifact saved uncategorized",
                        reference
                    ));
                    None
                }
            }
        }
        None => None,
    };

    // Upload images one at a time; a file that fails is skipped and the
    // rest of the submission proceeds
    debug!(stage = ?IngestStage::MediaUploading, images = submission.images.len());
    let mut image_urls: Vec<String> = Vec::new();
    match &state.clients.media_host {
        Some(client) => {
            for file in &submission.images {
                match client.upload(&file.filename, file.bytes.clone()).await {
                    Ok(media) => image_urls.push(media.url),
                    Err(err) => {
                        warn!(filename = %file.filename, error = %err, "Image upload failed, skipping file");
                        warnings.push(format!("Image '{}' could not be stored", file.filename));
                    }
                }
            }
        }
        None => {
            if !submission.images.is_empty() {
                warn!("Media host not configured; images skipped");
                warnings.push("Media host not configured; images were not stored".to_string());
            }
        }
    }

    // Audio upload and transcription are each best-effort; failure means
    // an absent audio entry / transcript, never a request failure
    let mut audio_url: Option<String> = None;
    let mut transcript: Option<String> = None;
    if let Some(audio) = &submission.audio {
        if let Some(client) = &state.clients.media_host {
            match client.upload(&audio.filename, audio.bytes.clone()).await {
                Ok(media) => audio_url = Some(media.url),
                Err(err) => {
                    warn!(error = %err, "Voice note upload failed");
                    warnings.push("Voice note could not be stored".to_string());
                }
            }
        }

        debug!(stage = ?IngestStage::Transcribing);
        if let Some(client) = &state.clients.speech {
            match client.transcribe(&audio.filename, audio.bytes.clone()).await {
                Ok(text) => transcript = Some(text),
                Err(err) => {
                    warn!(error = %err, "Transcription failed");
                    warnings.push("Voice note could not be transcribed".to_string());
                }
            }
        }
    }

    // Structuring is total: a configured service that fails, or invalid
    // output, falls back to the deterministic local summary
    debug!(stage = ?IngestStage::Structuring);
    let (content, used_fallback) = structurer::structure(
        state.clients.generation.as_deref(),
        &submission.text,
        transcript.as_deref(),
        &image_urls,
    )
    .await;
    if used_fallback && state.clients.generation.is_some() {
        warnings.push("Summary generation unavailable; used local fallback".to_string());
    }

    // Media order: generated entries first, then the voice note
    let mut media = content.media;
    if let Some(url) = audio_url {
        media.push(MediaItem::audio(url));
    }

    debug!(stage = ?IngestStage::Slugging);
    let artifact_slug = slug::slug_or_random(&content.title, "artifact");

    let artifact = Artifact {
        id: ids::generate(),
        slug: artifact_slug,
        title: content.title,
        summary: content.summary,
        owner_id: owner_id.to_string(),
        collection_id,
        payload: ArtifactPayload {
            media,
            transcript,
            collection_id,
            ..Default::default()
        },
        created_at: Utc::now(),
    };

    // The write is the only fatal stage after authentication
    debug!(stage = ?IngestStage::Writing, artifact_id = %artifact.id);
    let outcome = db::artifacts::insert_artifact(&state.db, &artifact)
        .await
        .map_err(|err| {
            error!(error = %err, "Artifact write failed");
            ApiError::Internal(format!("Failed to save artifact: {}", err))
        })?;
    if !outcome.dropped_columns.is_empty() {
        debug!(dropped = ?outcome.dropped_columns, "Insert adapted to live schema");
    }

    // One best-effort pass to settle the top-level collection column;
    // the payload mirror stays authoritative for display regardless
    if let Some(collection_id) = collection_id {
        debug!(stage = ?IngestStage::Reconciling, artifact_id = %artifact.id);
        if let Err(err) =
            db::artifacts::reconcile_collection(&state.db, artifact.id, collection_id).await
        {
            warn!(error = %err, "Collection reconciliation failed");
            warnings.push("Collection association could not be fully persisted".to_string());
        }
    }

    debug!(stage = ?IngestStage::Done, artifact_id = %artifact.id, slug = %artifact.slug);
    let warning = if warnings.is_empty() {
        None
    } else {
        Some(warnings.join("; "))
    };

    Ok(IngestOutcome {
        artifact_id: artifact.id,
        slug: artifact.slug,
        collection_id,
        warning,
    })
}
