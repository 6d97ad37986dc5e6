//! External provider clients
//!
//! One client per collaborator: object host, speech-to-text, text
//! generation. Clients are constructed once at startup from resolved
//! configuration and injected through `AppState`; an unconfigured or
//! unconstructable client leaves its pipeline stage disabled.

pub mod media_host;
pub mod structurer;
pub mod transcriber;

pub use media_host::{MediaHostClient, UploadedMedia};
pub use structurer::{GenerationClient, StructuredContent};
pub use transcriber::SpeechClient;

use crate::config::ServiceConfig;
use std::sync::Arc;
use tracing::warn;

/// The set of provider clients available to the pipeline
#[derive(Clone, Default)]
pub struct ProviderClients {
    pub media_host: Option<Arc<MediaHostClient>>,
    pub speech: Option<Arc<SpeechClient>>,
    pub generation: Option<Arc<GenerationClient>>,
}

impl ProviderClients {
    /// Construct clients for every configured provider.
    ///
    /// A client that fails to construct is logged and disabled; provider
    /// availability is a degradation concern, never a startup failure.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let media_host = config.media_host.as_ref().and_then(|provider| {
            MediaHostClient::new(provider)
                .map_err(|e| warn!(error = %e, "Media host client unavailable"))
                .ok()
                .map(Arc::new)
        });

        let speech = config.speech.as_ref().and_then(|provider| {
            SpeechClient::new(provider)
                .map_err(|e| warn!(error = %e, "Speech client unavailable"))
                .ok()
                .map(Arc::new)
        });

        let generation = config.generation.as_ref().and_then(|provider| {
            GenerationClient::new(provider)
                .map_err(|e| warn!(error = %e, "Generation client unavailable"))
                .ok()
                .map(Arc::new)
        });

        Self {
            media_host,
            speech,
            generation,
        }
    }
}
