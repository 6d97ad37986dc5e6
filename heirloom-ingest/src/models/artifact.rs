//! Artifact model
//!
//! One persisted catalog entry: generated title and summary, the media
//! gallery, an optional voice-note transcript, and the owning user and
//! collection references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Media entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
}

/// One piece of media attached to an artifact.
///
/// Owned by exactly one artifact; no independent identity or lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Media kind ("image" or "audio")
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Public source URL
    pub src: String,
    /// Alt text (image only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl MediaItem {
    pub fn image(src: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            src: src.into(),
            alt: None,
        }
    }

    pub fn audio(src: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Audio,
            src: src.into(),
            alt: None,
        }
    }
}

/// JSON payload column mirroring the full record.
///
/// Persisted alongside the normalized columns; remains authoritative for
/// display when a normalized column is absent on an older deployment
/// schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPayload {
    /// Ordered media gallery (generation order, then upload order)
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// Voice note transcript, when transcription succeeded
    #[serde(default)]
    pub transcript: Option<String>,
    /// User-assigned tags (empty at ingestion time)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display theme
    #[serde(default)]
    pub theme: Option<String>,
    /// Visibility ("private" unless changed later)
    #[serde(default = "default_privacy")]
    pub privacy: String,
    /// Mirror of the resolved collection reference
    #[serde(default)]
    pub collection_id: Option<Uuid>,
}

fn default_privacy() -> String {
    "private".to_string()
}

impl Default for ArtifactPayload {
    fn default() -> Self {
        Self {
            media: Vec::new(),
            transcript: None,
            tags: Vec::new(),
            theme: None,
            privacy: default_privacy(),
            collection_id: None,
        }
    }
}

/// One persisted catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Canonical identifier (server-generated)
    pub id: Uuid,
    /// URL-safe slug derived from the title (not guaranteed unique)
    pub slug: String,
    /// Generated or fallback title
    pub title: String,
    /// Generated or fallback summary
    pub summary: String,
    /// Authenticated owner
    pub owner_id: String,
    /// Owning collection; None means uncategorized
    pub collection_id: Option<Uuid>,
    /// JSON mirror (media, transcript, tags, theme, privacy)
    pub payload: ArtifactPayload,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_item_wire_shape() {
        let item = MediaItem::image("https://cdn.example.com/a.jpg");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["src"], "https://cdn.example.com/a.jpg");
        // alt is omitted entirely when absent
        assert!(json.get("alt").is_none());
    }

    #[test]
    fn test_payload_defaults() {
        let payload: ArtifactPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.media.is_empty());
        assert!(payload.transcript.is_none());
        assert_eq!(payload.privacy, "private");
    }
}
