//! Media host client
//!
//! Uploads binary files (images, voice notes) to the external object
//! host and returns a stable public URL. Hosts have shipped several
//! response shapes over time (bare URL string, `{secure_url}`, `{url}`,
//! and the same nested under `{data: {...}}`); all of them are
//! normalized to [`UploadedMedia`] right here at the provider boundary,
//! so nothing downstream ever branches on a provider shape.

use crate::config::ProviderConfig;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = "Heirlooms/0.1.0 (https://github.com/heirlooms/heirlooms)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Total tries per file, counting the first attempt
const MAX_ATTEMPTS: u32 = 2;
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Media host client errors
#[derive(Debug, Error)]
pub enum MediaHostError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Media host returned error {0}: {1}")]
    Api(u16, String),

    #[error("Unrecognized upload response shape: {0}")]
    Shape(String),

    #[error("Empty file rejected")]
    EmptyFile,
}

/// Normalized upload result: the one shape the rest of the service sees
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    /// Stable public URL of the stored object
    pub url: String,
}

/// Media host API client
pub struct MediaHostClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MediaHostClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, MediaHostError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MediaHostError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Upload one file and return its public URL.
    ///
    /// Transient failures (network errors, 5xx) are retried once with a
    /// short backoff; 4xx responses fail immediately.
    pub async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedMedia, MediaHostError> {
        if bytes.is_empty() {
            return Err(MediaHostError::EmptyFile);
        }

        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut last_error = MediaHostError::Network("no attempt made".to_string());
        for attempt in 1..=MAX_ATTEMPTS {
            match self
                .try_upload(filename, bytes.clone(), &content_type)
                .await
            {
                Ok(media) => {
                    debug!(url = %media.url, filename, "Upload complete");
                    return Ok(media);
                }
                Err(err) => {
                    let transient = matches!(
                        &err,
                        MediaHostError::Network(_) | MediaHostError::Api(500..=599, _)
                    );
                    if !transient || attempt == MAX_ATTEMPTS {
                        return Err(err);
                    }
                    warn!(filename, attempt, error = %err, "Upload failed, retrying");
                    last_error = err;
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }

        Err(last_error)
    }

    async fn try_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UploadedMedia, MediaHostError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| MediaHostError::Network(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaHostError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaHostError::Api(status.as_u16(), body));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| MediaHostError::Shape(e.to_string()))?;

        normalize_upload_response(&value)
            .ok_or_else(|| MediaHostError::Shape(value.to_string()))
    }
}

/// Extract the public URL from any known host response shape.
///
/// Tried in order: bare string, `secure_url`, `url`, then the same keys
/// under a nested `data` object.
pub fn normalize_upload_response(value: &Value) -> Option<UploadedMedia> {
    fn url_from(value: &Value) -> Option<String> {
        if let Some(url) = value.as_str() {
            return non_empty(url);
        }
        let obj = value.as_object()?;
        for key in ["secure_url", "url"] {
            if let Some(url) = obj.get(key).and_then(Value::as_str).and_then(non_empty) {
                return Some(url);
            }
        }
        None
    }

    fn non_empty(s: &str) -> Option<String> {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    url_from(value)
        .or_else(|| value.get("data").and_then(url_from))
        .map(|url| UploadedMedia { url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_string_response() {
        let value = json!("https://cdn.example.com/abc.jpg");
        assert_eq!(
            normalize_upload_response(&value).unwrap().url,
            "https://cdn.example.com/abc.jpg"
        );
    }

    #[test]
    fn test_secure_url_response() {
        let value = json!({"secure_url": "https://cdn.example.com/abc.jpg", "public_id": "abc"});
        assert_eq!(
            normalize_upload_response(&value).unwrap().url,
            "https://cdn.example.com/abc.jpg"
        );
    }

    #[test]
    fn test_url_response() {
        let value = json!({"url": "https://cdn.example.com/abc.jpg"});
        assert_eq!(
            normalize_upload_response(&value).unwrap().url,
            "https://cdn.example.com/abc.jpg"
        );
    }

    #[test]
    fn test_nested_data_response() {
        let value = json!({"data": {"url": "https://cdn.example.com/abc.jpg"}});
        assert_eq!(
            normalize_upload_response(&value).unwrap().url,
            "https://cdn.example.com/abc.jpg"
        );
    }

    #[test]
    fn test_secure_url_preferred_over_url() {
        let value = json!({
            "secure_url": "https://cdn.example.com/abc.jpg",
            "url": "http://cdn.example.com/abc.jpg"
        });
        assert_eq!(
            normalize_upload_response(&value).unwrap().url,
            "https://cdn.example.com/abc.jpg"
        );
    }

    #[test]
    fn test_unknown_shapes_rejected() {
        for value in [
            json!({"id": "abc"}),
            json!({"data": {"id": "abc"}}),
            json!(""),
            json!(42),
            json!(null),
            json!({"url": ""}),
        ] {
            assert!(normalize_upload_response(&value).is_none(), "{}", value);
        }
    }
}
