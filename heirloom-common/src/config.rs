//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// TOML configuration file contents
///
/// Default location: `<config_dir>/heirlooms/heirlooms.toml`
/// (e.g. `~/.config/heirlooms/heirlooms.toml` on Linux)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP bind address (e.g. "127.0.0.1:5740")
    pub bind_address: Option<String>,
    /// SQLite database file path
    pub database_path: Option<String>,
    /// Object/image host credentials
    #[serde(default)]
    pub media_host: ProviderToml,
    /// Speech-to-text service credentials
    #[serde(default)]
    pub speech: ProviderToml,
    /// Text-generation service credentials
    #[serde(default)]
    pub generation: ProviderToml,
}

/// Credentials for one external provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderToml {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("heirlooms").join("heirlooms.toml"))
}

/// Default database file path for the platform
/// (e.g. `~/.local/share/heirlooms/heirlooms.db` on Linux)
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("heirlooms").join("heirlooms.db"))
        .unwrap_or_else(|| PathBuf::from("heirlooms.db"))
}

/// Load the TOML config file, falling back to defaults when absent.
///
/// A missing file is not an error (all settings have ENV or compiled
/// defaults); a file that exists but fails to parse is.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Resolve a single setting with ENV → TOML → default priority.
///
/// Warns when more than one source supplies a value (potential
/// misconfiguration); the higher-priority source wins.
pub fn resolve_setting(
    name: &str,
    env_var: &str,
    toml_value: Option<&str>,
    default: &str,
) -> String {
    let env_value = std::env::var(env_var).ok().filter(|v| !v.trim().is_empty());
    let toml_value = toml_value.filter(|v| !v.trim().is_empty());

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            setting = name,
            "Setting found in both environment and TOML config. Using environment (highest priority)."
        );
    }

    if let Some(value) = env_value {
        return value;
    }
    if let Some(value) = toml_value {
        return value.to_string();
    }
    default.to_string()
}

/// Resolve an optional setting with ENV → TOML priority and no default.
pub fn resolve_optional_setting(env_var: &str, toml_value: Option<&str>) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| toml_value.filter(|v| !v.trim().is_empty()).map(String::from))
}
