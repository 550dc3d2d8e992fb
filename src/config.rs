//! Runtime configuration shared by every node invocation.
//!
//! Values come from, in increasing precedence: built-in defaults, a YAML file
//! and `FLOWNODES_*` environment variables.
//!
//! ```yaml
//! openai_base_url: "https://api.openai.com/v1"
//! anthropic_base_url: "https://api.anthropic.com"
//! http_timeout_secs: 60
//! max_retries: 2
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default OpenAI REST base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Anthropic REST base URL.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Default request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Default number of retries on 429/5xx for chat models.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Provider endpoints and HTTP behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Base URL for OpenAI requests (image generation).
    pub openai_base_url: String,
    /// Base URL for Anthropic requests (chat models).
    pub anthropic_base_url: String,
    /// Per-request timeout in seconds.
    pub http_timeout_secs: u64,
    /// Retry budget for chat-model calls.
    pub max_retries: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file from disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::default().with_overrides(&vars)
    }

    /// Apply `FLOWNODES_*` overrides from an explicit variable map.
    pub fn with_overrides(mut self, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        if let Some(url) = vars.get("FLOWNODES_OPENAI_BASE_URL") {
            self.openai_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = vars.get("FLOWNODES_ANTHROPIC_BASE_URL") {
            self.anthropic_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = vars.get("FLOWNODES_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse_var("FLOWNODES_HTTP_TIMEOUT_SECS", raw)?;
        }
        if let Some(raw) = vars.get("FLOWNODES_MAX_RETRIES") {
            self.max_retries = parse_var("FLOWNODES_MAX_RETRIES", raw)?;
        }
        Ok(self)
    }

    /// The request timeout as a [`Duration`].
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Build the HTTP client shared by providers.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(self.http_timeout()).build()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.anthropic_base_url, "https://api.anthropic.com");
        assert_eq!(config.http_timeout(), Duration::from_secs(120));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RuntimeConfig::from_yaml_str("http_timeout_secs: 5\n").unwrap();
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(RuntimeConfig::from_yaml_str("").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = RuntimeConfig::from_yaml_str("http_timeout_secs: [not, a, number]");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "openai_base_url: \"http://localhost:9999/v1\"").unwrap();
        writeln!(file, "max_retries: 0").unwrap();

        let config = RuntimeConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.openai_base_url, "http://localhost:9999/v1");
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_env_overrides() {
        let mut vars = HashMap::new();
        vars.insert(
            "FLOWNODES_ANTHROPIC_BASE_URL".to_string(),
            "http://127.0.0.1:8080/".to_string(),
        );
        vars.insert("FLOWNODES_HTTP_TIMEOUT_SECS".to_string(), "7".to_string());

        let config = RuntimeConfig::default().with_overrides(&vars).unwrap();
        assert_eq!(config.anthropic_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.http_timeout_secs, 7);
    }

    #[test]
    fn test_env_override_invalid_number() {
        let mut vars = HashMap::new();
        vars.insert("FLOWNODES_MAX_RETRIES".to_string(), "many".to_string());

        let err = RuntimeConfig::default().with_overrides(&vars).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for FLOWNODES_MAX_RETRIES: many");
    }
}
