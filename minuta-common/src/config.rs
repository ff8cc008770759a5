//! Configuration loading: TOML file plus environment overrides
//!
//! Resolution priority, highest first:
//! 1. Environment variable
//! 2. TOML config file
//! 3. Compiled default

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Values read from the optional TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub database_path: Option<String>,
    pub bind_address: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_concurrent_analyses: Option<usize>,
}

impl TomlConfig {
    /// Load the TOML config from an explicit path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load the TOML config from the default location, if it exists
    ///
    /// Looks for `minuta.toml` in the current directory, then
    /// `/etc/minuta/minuta.toml`. A missing file is not an error.
    pub fn load_default() -> Result<Self> {
        for candidate in [
            PathBuf::from("minuta.toml"),
            PathBuf::from("/etc/minuta/minuta.toml"),
        ] {
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }
        Ok(Self::default())
    }
}

/// Resolve a string setting: ENV → TOML → default
pub fn resolve_string(env_var: &str, toml_value: Option<&str>, default: &str) -> String {
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return value;
        }
    }
    if let Some(value) = toml_value {
        if !value.trim().is_empty() {
            return value.to_string();
        }
    }
    default.to_string()
}

/// Resolve an optional string setting: ENV → TOML → None
pub fn resolve_optional(env_var: &str, toml_value: Option<&str>) -> Option<String> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.trim().is_empty() {
            return Some(value);
        }
    }
    toml_value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn toml_config_parses_known_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database_path = \"/tmp/minuta.db\"\nopenai_model = \"gpt-4o\"\nmax_concurrent_analyses = 2"
        )
        .unwrap();

        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.database_path.as_deref(), Some("/tmp/minuta.db"));
        assert_eq!(config.openai_model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.max_concurrent_analyses, Some(2));
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn resolve_string_falls_back_to_default() {
        let value = resolve_string("MINUTA_TEST_UNSET_VAR", None, "fallback");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn resolve_string_prefers_toml_over_default() {
        let value = resolve_string("MINUTA_TEST_UNSET_VAR", Some("from-toml"), "fallback");
        assert_eq!(value, "from-toml");
    }
}
