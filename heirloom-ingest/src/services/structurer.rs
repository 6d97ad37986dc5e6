//! Content structurer
//!
//! Turns raw notes, an optional voice-note transcript, and the uploaded
//! image URLs into a `{title, summary, media[]}` record via the external
//! text-generation service. The generated output is parsed and validated
//! strictly; anything else (service unavailable, non-JSON output, shape
//! violations) falls back to a deterministic local summary that never
//! fails. Either way, every uploaded image URL is guaranteed to appear in
//! the resulting media list.

use crate::config::ProviderConfig;
use crate::models::{MediaItem, MediaKind};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = "Heirlooms/0.1.0 (https://github.com/heirlooms/heirlooms)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum accepted title length from the generation service
pub const MAX_TITLE_LEN: usize = 120;
/// Title length used by the local fallback
const FALLBACK_TITLE_LEN: usize = 60;
/// Title of last resort
pub const UNTITLED: &str = "Untitled Artifact";

/// Generation client errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Generation service returned error {0}: {1}")]
    Api(u16, String),
}

/// Structured record produced for one submission
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredContent {
    pub title: String,
    pub summary: String,
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    text: String,
}

/// Text-generation API client
pub struct GenerationClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GenerationClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Send one prompt and return the raw completion text
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .http
            .post(format!("{}/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api(status.as_u16(), body));
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(parsed.text)
    }
}

/// Produce the structured record for one submission.
///
/// Primary path: prompt the generation service and validate its output.
/// Fallback path: [`fallback_content`], used when the service is not
/// configured, unreachable, or returns an invalid shape. Returns the
/// content and whether the fallback was used.
pub async fn structure(
    client: Option<&GenerationClient>,
    notes: &str,
    transcript: Option<&str>,
    image_urls: &[String],
) -> (StructuredContent, bool) {
    let mut content = match client {
        Some(client) => {
            let prompt = build_prompt(notes, transcript, image_urls);
            match client.generate(&prompt).await {
                Ok(raw) => match extract_json(&raw).and_then(|v| validate_content(&v)) {
                    Some(content) => {
                        debug!(title = %content.title, "Generation service produced valid content");
                        (content, false)
                    }
                    None => {
                        warn!("Generation output failed shape validation, using fallback");
                        (fallback_content(notes, transcript, image_urls), true)
                    }
                },
                Err(err) => {
                    warn!(error = %err, "Generation service unavailable, using fallback");
                    (fallback_content(notes, transcript, image_urls), true)
                }
            }
        }
        None => (fallback_content(notes, transcript, image_urls), true),
    };

    ensure_images(&mut content.0, image_urls);
    content
}

/// Build the generation instruction
pub fn build_prompt(notes: &str, transcript: Option<&str>, image_urls: &[String]) -> String {
    let mut prompt = String::from(
        "You are cataloguing a family heirloom. Using the material below, reply with \
         strict JSON only, no prose, of the shape \
         {\"title\": string, \"summary\": string, \"media\": [{\"type\": \"image\", \
         \"src\": string, \"alt\": string}]}. \
         The title must be at most 120 characters. Include every image URL given.\n\n",
    );

    prompt.push_str("Notes:\n");
    prompt.push_str(if notes.trim().is_empty() { "(none)" } else { notes });
    prompt.push('\n');

    if let Some(transcript) = transcript {
        prompt.push_str("\nVoice note transcript:\n");
        prompt.push_str(transcript);
        prompt.push('\n');
    }

    if !image_urls.is_empty() {
        prompt.push_str("\nImage URLs:\n");
        for url in image_urls {
            prompt.push_str(url);
            prompt.push('\n');
        }
    }

    prompt
}

/// Parse generation output as JSON.
///
/// Tries a direct parse first; if the model wrapped the object in prose,
/// falls back to the greedy slice from the first `{` to the last `}`.
pub fn extract_json(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(value);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Validate the generated value against the strict record shape.
///
/// Requires: non-empty title of at most [`MAX_TITLE_LEN`] characters,
/// non-empty summary, and a media array whose entries are
/// `{type: "image", src: <valid URL>, alt?: string}`. Any violation
/// rejects the whole record.
pub fn validate_content(value: &Value) -> Option<StructuredContent> {
    let obj = value.as_object()?;

    let title = obj.get("title")?.as_str()?.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return None;
    }

    let summary = obj.get("summary")?.as_str()?.trim();
    if summary.is_empty() {
        return None;
    }

    let mut media = Vec::new();
    if let Some(entries) = obj.get("media") {
        for entry in entries.as_array()? {
            let entry = entry.as_object()?;
            if entry.get("type")?.as_str()? != "image" {
                return None;
            }
            let src = entry.get("src")?.as_str()?;
            if !is_valid_url(src) {
                return None;
            }
            let alt = match entry.get("alt") {
                Some(alt) => Some(alt.as_str()?.to_string()),
                None => None,
            };
            media.push(MediaItem {
                kind: MediaKind::Image,
                src: src.to_string(),
                alt,
            });
        }
    }

    Some(StructuredContent {
        title: title.to_string(),
        summary: summary.to_string(),
        media,
    })
}

/// Append any input image URL the generated media list omitted.
///
/// Guarantees no successfully uploaded image is silently dropped,
/// regardless of what the generation service returned.
pub fn ensure_images(content: &mut StructuredContent, image_urls: &[String]) {
    for url in image_urls {
        if !content.media.iter().any(|item| &item.src == url) {
            content.media.push(MediaItem::image(url.clone()));
        }
    }
}

/// Deterministic local record used when generation is unavailable.
///
/// Total by construction: title from the first characters of the notes,
/// then the transcript, then [`UNTITLED`]; fixed summary noting whether a
/// transcript contributed; media mapped directly from the image URLs.
pub fn fallback_content(
    notes: &str,
    transcript: Option<&str>,
    image_urls: &[String],
) -> StructuredContent {
    let title_source = if !notes.trim().is_empty() {
        notes.trim()
    } else {
        transcript.map(str::trim).unwrap_or("")
    };

    let title = if title_source.is_empty() {
        UNTITLED.to_string()
    } else {
        title_source
            .chars()
            .take(FALLBACK_TITLE_LEN)
            .collect::<String>()
            .trim_end()
            .to_string()
    };

    let summary = if transcript.is_some() {
        "Generated from notes and voice transcript.".to_string()
    } else {
        "Generated from notes.".to_string()
    };

    StructuredContent {
        title,
        summary,
        media: image_urls.iter().map(MediaItem::image).collect(),
    }
}

fn is_valid_url(src: &str) -> bool {
    match reqwest::Url::parse(src) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fallback_from_notes() {
        let images = urls(&["https://cdn.example.com/watch.jpg"]);
        let content = fallback_content("Grandpa's watch", None, &images);

        assert_eq!(content.title, "Grandpa's watch");
        assert_eq!(content.summary, "Generated from notes.");
        assert_eq!(
            content.media,
            vec![MediaItem::image("https://cdn.example.com/watch.jpg")]
        );
    }

    #[test]
    fn test_fallback_title_from_transcript_when_notes_empty() {
        let content = fallback_content("  ", Some("This was my grandfather's pocket watch"), &[]);
        assert_eq!(content.title, "This was my grandfather's pocket watch");
        assert_eq!(content.summary, "Generated from notes and voice transcript.");
    }

    #[test]
    fn test_fallback_untitled_when_everything_empty() {
        let content = fallback_content("", None, &[]);
        assert_eq!(content.title, UNTITLED);
        assert!(content.media.is_empty());
    }

    #[test]
    fn test_fallback_truncates_long_notes() {
        let notes = "x".repeat(500);
        let content = fallback_content(&notes, None, &[]);
        assert_eq!(content.title.chars().count(), 60);
    }

    #[test]
    fn test_extract_direct_json() {
        let value = extract_json(r#"{"title": "t"}"#).unwrap();
        assert_eq!(value["title"], "t");
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let raw = r#"Sure! Here is the JSON you asked for:
{"title": "Watch", "summary": "An old watch.", "media": []}
Let me know if you need anything else."#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value["title"], "Watch");
    }

    #[test]
    fn test_extract_rejects_braceless_output() {
        assert!(extract_json("no json here").is_none());
        assert!(extract_json("} backwards {").is_none());
    }

    #[test]
    fn test_validate_accepts_well_formed_record() {
        let value = json!({
            "title": "Watch",
            "summary": "An old watch.",
            "media": [
                {"type": "image", "src": "https://cdn.example.com/a.jpg", "alt": "the watch"}
            ]
        });
        let content = validate_content(&value).unwrap();
        assert_eq!(content.title, "Watch");
        assert_eq!(content.media.len(), 1);
        assert_eq!(content.media[0].alt.as_deref(), Some("the watch"));
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let cases = [
            json!({"summary": "s", "media": []}),                        // missing title
            json!({"title": "", "summary": "s"}),                        // empty title
            json!({"title": "t".repeat(121), "summary": "s"}),           // title too long
            json!({"title": "t", "summary": "  "}),                      // blank summary
            json!({"title": "t", "summary": "s", "media": "nope"}),      // media not an array
            json!({"title": "t", "summary": "s",
                   "media": [{"type": "audio", "src": "https://x.com/a"}]}), // wrong kind
            json!({"title": "t", "summary": "s",
                   "media": [{"type": "image", "src": "not a url"}]}),   // invalid URL
            json!(["not", "an", "object"]),
        ];
        for case in cases {
            assert!(validate_content(&case).is_none(), "{}", case);
        }
    }

    #[test]
    fn test_validate_accepts_missing_media_key() {
        let value = json!({"title": "t", "summary": "s"});
        let content = validate_content(&value).unwrap();
        assert!(content.media.is_empty());
    }

    #[test]
    fn test_ensure_images_appends_missing_urls() {
        let mut content = StructuredContent {
            title: "t".to_string(),
            summary: "s".to_string(),
            media: vec![MediaItem::image("https://cdn.example.com/a.jpg")],
        };
        let images = urls(&[
            "https://cdn.example.com/a.jpg",
            "https://cdn.example.com/b.jpg",
        ]);

        ensure_images(&mut content, &images);

        assert_eq!(content.media.len(), 2);
        assert_eq!(content.media[1].src, "https://cdn.example.com/b.jpg");

        // Idempotent: nothing is appended twice
        ensure_images(&mut content, &images);
        assert_eq!(content.media.len(), 2);
    }

    #[tokio::test]
    async fn test_structure_without_client_never_fails() {
        let images = urls(&["https://cdn.example.com/a.jpg"]);
        let (content, used_fallback) =
            structure(None, "Grandpa's watch", None, &images).await;

        assert!(used_fallback);
        assert_eq!(content.title, "Grandpa's watch");
        assert!(content
            .media
            .iter()
            .any(|m| m.src == "https://cdn.example.com/a.jpg"));
    }
}
