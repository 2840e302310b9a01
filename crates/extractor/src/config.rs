//! Configuration loading for extraction.
//!
//! Extraction settings live in the `[extraction]` table of a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use plot_events::connection_types;

use crate::sanitize::DEFAULT_DIAGNOSTIC_WINDOW;

/// Default model asked to extract timelines.
pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";

/// Extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Minimum gap between two requests, in milliseconds
    pub min_request_interval_ms: u64,
    /// Longest narrative accepted, in characters
    pub max_text_length: usize,
    /// Confidence attached to every extracted narrative reference
    pub source_confidence: f64,
    /// Connection type used when the extraction names none
    pub default_connection_type: String,
    /// Title given to a generated story that had none
    pub default_title: String,
    /// Model id passed to the backend
    pub model_id: String,
    /// Characters of context shown on each side of a parse failure
    pub diagnostic_window: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_request_interval_ms: 5000,
            max_text_length: 10_000,
            source_confidence: 0.8,
            default_connection_type: connection_types::CAUSES.to_string(),
            default_title: "Generated Story".to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            diagnostic_window: DEFAULT_DIAGNOSTIC_WINDOW,
        }
    }
}

impl ExtractorConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Returns this configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::default();
        assert_eq!(config.min_request_interval_ms, 5000);
        assert_eq!(config.max_text_length, 10_000);
        assert_eq!(config.default_connection_type, "causes");
        assert_eq!(config.model_id, "gemini-2.5-flash");
    }

    #[test]
    fn test_partial_override() {
        let config = ExtractorConfig::from_str("model_id = \"gemini-2.5-flash-lite\"\nmax_text_length = 200").unwrap();
        assert_eq!(config.model_id, "gemini-2.5-flash-lite");
        assert_eq!(config.max_text_length, 200);
        assert_eq!(config.source_confidence, 0.8);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ExtractorConfig::default();
        let toml = config.to_toml().unwrap();
        assert_eq!(ExtractorConfig::from_str(&toml).unwrap(), config);
    }

    #[test]
    fn test_bad_type_is_error() {
        assert!(matches!(
            ExtractorConfig::from_str("max_text_length = \"lots\""),
            Err(ConfigError::Toml(_))
        ));
    }
}
