//! Collection model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named grouping of artifacts, owned by a user, optionally public.
///
/// The identifier is immutable once created. The slug should be unique
/// among collections but uniqueness is best-effort, not enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Canonical identifier
    pub id: Uuid,
    /// Human-readable slug
    pub slug: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// Cover image URL on the media host
    pub cover_url: Option<String>,
    /// Owning user
    pub owner_id: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}
