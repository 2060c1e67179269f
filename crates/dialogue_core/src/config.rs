use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::config_json_path;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const API_PREFIX: &str = "/api/v1";
pub const DEFAULT_SUMMARY_WORDS: u32 = 15;

const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Backend origin, without the API prefix
    pub api_base: Option<String>,
    #[serde(default)]
    pub http_proxy: String,
    #[serde(default)]
    pub https_proxy: String,
    #[serde(default)]
    pub http_proxy_auth: Option<ProxyAuth>,
    #[serde(default)]
    pub https_proxy_auth: Option<ProxyAuth>,
    /// Target word count when free text is summarized before insertion
    #[serde(default = "default_summary_words")]
    pub summary_word_count: u32,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

fn default_summary_words() -> u32 {
    DEFAULT_SUMMARY_WORDS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: None,
            http_proxy: String::new(),
            https_proxy: String::new(),
            http_proxy_auth: None,
            https_proxy_auth: None,
            summary_word_count: DEFAULT_SUMMARY_WORDS,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load from ~/.legalease/config.json, falling back to ./config.toml,
    /// then apply environment overrides. Unreadable files are skipped.
    pub fn new() -> Self {
        let mut config = Config::default();

        let json_path = config_json_path();
        let mut loaded = false;
        if json_path.exists() {
            match Self::load_from_file(&json_path) {
                Ok(file_config) => {
                    config = file_config;
                    loaded = true;
                }
                Err(err) => log::warn!("Ignoring config {}: {}", json_path.display(), err),
            }
        }

        let toml_path = Path::new(CONFIG_FILE_PATH);
        if !loaded && toml_path.exists() {
            match Self::load_from_file(toml_path) {
                Ok(file_config) => config = file_config,
                Err(err) => log::warn!("Ignoring config {}: {}", CONFIG_FILE_PATH, err),
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Parse a config file; `.json` files are JSON, everything else TOML.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_base) = lookup("LEGALEASE_API_BASE") {
            self.api_base = Some(api_base);
        }
        if let Some(http_proxy) = lookup("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Some(https_proxy) = lookup("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
        if let Some(words) = lookup("LEGALEASE_SUMMARY_WORDS") {
            match words.trim().parse() {
                Ok(words) => self.summary_word_count = words,
                Err(_) => log::warn!("Ignoring LEGALEASE_SUMMARY_WORDS={words:?}"),
            }
        }
        if let Some(timeout) = lookup("LEGALEASE_TIMEOUT_SECS") {
            match timeout.trim().parse() {
                Ok(secs) => self.request_timeout_secs = Some(secs),
                Err(_) => log::warn!("Ignoring LEGALEASE_TIMEOUT_SECS={timeout:?}"),
            }
        }
    }

    /// Root of every endpoint, e.g. `http://localhost:8000/api/v1`.
    pub fn api_root(&self) -> String {
        let base = self
            .api_base
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE);
        format!("{}{}", base.trim_end_matches('/'), API_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn api_root_defaults_to_local_backend() {
        assert_eq!(Config::default().api_root(), "http://localhost:8000/api/v1");
    }

    #[test]
    fn api_root_trims_trailing_slash() {
        let config = Config {
            api_base: Some("https://legal.example/".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_root(), "https://legal.example/api/v1");
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            ("LEGALEASE_API_BASE", "http://backend:9000"),
            ("LEGALEASE_SUMMARY_WORDS", "20"),
            ("LEGALEASE_TIMEOUT_SECS", "oops"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.api_base.as_deref(), Some("http://backend:9000"));
        assert_eq!(config.summary_word_count, 20);
        assert_eq!(config.request_timeout_secs, None);
        assert!(config.http_proxy.is_empty());
    }

    #[test]
    fn toml_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base = \"http://10.0.0.2:8000\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.api_base.as_deref(), Some("http://10.0.0.2:8000"));
        assert_eq!(config.summary_word_count, DEFAULT_SUMMARY_WORDS);
    }

    #[test]
    fn json_file_is_parsed_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base": null, "summary_word_count": 30}"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.summary_word_count, 30);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::load_from_file(Path::new("/nonexistent/legalease.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
