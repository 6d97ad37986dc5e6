//! Speech-to-text client
//!
//! Sends a voice note to the external transcription service and returns
//! the transcript text. The pipeline treats transcription as fully
//! best-effort: every error here becomes an absent transcript, never a
//! request-level failure.

use crate::config::ProviderConfig;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "Heirlooms/0.1.0 (https://github.com/heirlooms/heirlooms)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Speech client errors
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Speech service returned error {0}: {1}")]
    Api(u16, String),

    #[error("Response carried no transcript text")]
    NoTranscript,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    text: Option<String>,
    transcript: Option<String>,
}

/// Speech-to-text API client
pub struct SpeechClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SpeechClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, SpeechError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Transcribe one voice note to text
    pub async fn transcribe(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SpeechError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| SpeechError::Network(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api(status.as_u16(), body));
        }

        let parsed: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let text = parsed
            .text
            .or(parsed.transcript)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SpeechError::NoTranscript)?;

        debug!(filename, chars = text.len(), "Transcription complete");
        Ok(text)
    }
}
