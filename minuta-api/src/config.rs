//! Configuration resolution for minuta-api
//!
//! Every setting resolves ENV → TOML → default, matching the shared
//! resolution helpers in minuta-common.

use minuta_common::config::{resolve_optional, resolve_string, TomlConfig};
use minuta_common::Result;
use std::path::PathBuf;
use tracing::warn;

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Resolved service settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite database file path
    pub database_path: PathBuf,
    /// HTTP bind address
    pub bind_address: String,
    /// OpenAI API key; processing endpoints fail without it
    pub openai_api_key: Option<String>,
    /// Model identifier sent with every completion request
    pub openai_model: String,
    /// Timeout for one model call, in seconds
    pub request_timeout_secs: u64,
    /// Permits for concurrent outbound model calls
    pub max_concurrent_analyses: usize,
}

impl Settings {
    /// Resolve settings from the default TOML location and the environment
    pub fn resolve() -> Result<Self> {
        let toml = TomlConfig::load_default()?;
        Ok(Self::from_toml(&toml))
    }

    /// Resolve settings against an already-loaded TOML config
    pub fn from_toml(toml: &TomlConfig) -> Self {
        let database_path = PathBuf::from(resolve_string(
            "MINUTA_DATABASE_PATH",
            toml.database_path.as_deref(),
            "minuta.db",
        ));

        let bind_address = resolve_string(
            "MINUTA_BIND_ADDRESS",
            toml.bind_address.as_deref(),
            "127.0.0.1:8000",
        );

        let openai_api_key =
            resolve_optional("MINUTA_OPENAI_API_KEY", toml.openai_api_key.as_deref());
        if openai_api_key.is_none() {
            warn!("OpenAI API key not configured; transcript processing will be unavailable");
        }

        let openai_model = resolve_string(
            "MINUTA_OPENAI_MODEL",
            toml.openai_model.as_deref(),
            DEFAULT_MODEL,
        );

        let request_timeout_secs = std::env::var("MINUTA_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(toml.request_timeout_secs)
            .unwrap_or(60);

        let max_concurrent_analyses = std::env::var("MINUTA_MAX_CONCURRENT_ANALYSES")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(toml.max_concurrent_analyses)
            .unwrap_or(4)
            .max(1);

        Self {
            database_path,
            bind_address,
            openai_api_key,
            openai_model,
            request_timeout_secs,
            max_concurrent_analyses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_toml_is_empty() {
        let settings = Settings::from_toml(&TomlConfig::default());
        assert_eq!(settings.openai_model, DEFAULT_MODEL);
        assert_eq!(settings.request_timeout_secs, 60);
        assert_eq!(settings.max_concurrent_analyses, 4);
    }

    #[test]
    fn toml_values_override_defaults() {
        let toml = TomlConfig {
            openai_model: Some("gpt-4o".to_string()),
            max_concurrent_analyses: Some(2),
            ..Default::default()
        };
        let settings = Settings::from_toml(&toml);
        assert_eq!(settings.openai_model, "gpt-4o");
        assert_eq!(settings.max_concurrent_analyses, 2);
    }

    #[test]
    fn concurrency_floor_is_one() {
        let toml = TomlConfig {
            max_concurrent_analyses: Some(0),
            ..Default::default()
        };
        assert_eq!(Settings::from_toml(&toml).max_concurrent_analyses, 1);
    }
}
