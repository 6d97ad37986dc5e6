//! Submission model
//!
//! The ephemeral input to one ingestion request. Parsed from the
//! multipart form and dropped when the request completes; never
//! persisted as such.

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// One ingestion request
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Free-text notes
    pub text: String,
    /// Zero or more image files
    pub images: Vec<UploadFile>,
    /// Zero or one voice note
    pub audio: Option<UploadFile>,
    /// Collection reference: canonical identifier or slug.
    /// Accepted under any of the aliased field names
    /// (`collectionId`, `collection_id`, `collection`).
    pub collection_ref: Option<String>,
}
