//! Configuration resolution for heirloom-ingest
//!
//! Each setting resolves with ENV → TOML → default priority. The three
//! external providers are optional: a provider without both a base URL
//! and an API key is disabled, and the pipeline stage that would use it
//! degrades instead of failing the request.

use heirloom_common::config::{
    default_database_path, load_toml_config, resolve_optional_setting, resolve_setting,
    ProviderToml,
};
use heirloom_common::Result;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5740";

/// Credentials for one external provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP bind address
    pub bind_address: String,
    /// SQLite database file path
    pub database_path: PathBuf,
    /// Object/image host (uploads)
    pub media_host: Option<ProviderConfig>,
    /// Speech-to-text service (voice note transcription)
    pub speech: Option<ProviderConfig>,
    /// Text-generation service (title/summary structuring)
    pub generation: Option<ProviderConfig>,
}

impl ServiceConfig {
    /// Resolve configuration from environment and the TOML config file
    pub fn resolve() -> Result<Self> {
        let toml = load_toml_config(None)?;

        let bind_address = resolve_setting(
            "bind_address",
            "HEIRLOOMS_BIND_ADDRESS",
            toml.bind_address.as_deref(),
            DEFAULT_BIND_ADDRESS,
        );

        let database_path = resolve_setting(
            "database_path",
            "HEIRLOOMS_DATABASE_PATH",
            toml.database_path.as_deref(),
            &default_database_path().to_string_lossy(),
        );

        Ok(Self {
            bind_address,
            database_path: PathBuf::from(database_path),
            media_host: resolve_provider("media_host", "HEIRLOOMS_MEDIA_HOST", &toml.media_host),
            speech: resolve_provider("speech", "HEIRLOOMS_SPEECH", &toml.speech),
            generation: resolve_provider("generation", "HEIRLOOMS_GENERATION", &toml.generation),
        })
    }
}

/// Resolve one provider's credentials.
///
/// ENV variables are `<prefix>_URL` and `<prefix>_API_KEY`. A provider
/// missing either half is disabled with a warning rather than an error;
/// the pipeline treats every provider as best-effort.
fn resolve_provider(
    name: &str,
    env_prefix: &str,
    toml: &ProviderToml,
) -> Option<ProviderConfig> {
    let base_url = resolve_optional_setting(
        &format!("{}_URL", env_prefix),
        toml.base_url.as_deref(),
    );
    let api_key = resolve_optional_setting(
        &format!("{}_API_KEY", env_prefix),
        toml.api_key.as_deref(),
    );

    match (base_url, api_key) {
        (Some(base_url), Some(api_key)) => Some(ProviderConfig { base_url, api_key }),
        (None, None) => {
            warn!(provider = name, "Provider not configured, stage will be skipped");
            None
        }
        _ => {
            warn!(
                provider = name,
                "Provider partially configured (need both base_url and api_key), stage will be skipped"
            );
            None
        }
    }
}
