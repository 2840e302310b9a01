//! Configuration loading for the timeline store.
//!
//! Store settings live in the `[store]` table of a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use plot_events::{Palette, DEFAULT_TIMELINE_LENGTH};

use crate::history::DEFAULT_HISTORY_LIMIT;

/// Timeline store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of undo points kept
    pub history_limit: usize,
    /// Number of slots in the timeline of a fresh story
    pub default_timeline_length: usize,
    /// Colors cycled for new characters
    pub palette: Palette,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_timeline_length: DEFAULT_TIMELINE_LENGTH,
            palette: Palette::default(),
        }
    }
}

impl StoreConfig {
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
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Error writing TOML config
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = StoreConfig::from_str("history_limit = 5").unwrap();
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.default_timeline_length, 20);
        assert_eq!(config.palette, Palette::default());
    }

    #[test]
    fn test_custom_palette() {
        let config = StoreConfig::from_str(r##"palette = ["#111111", "#222222"]"##).unwrap();
        assert_eq!(config.palette.len(), 2);
        assert_eq!(config.palette.color_at(3), "#222222");
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = StoreConfig::default();
        let toml = config.to_toml().unwrap();
        assert_eq!(StoreConfig::from_str(&toml).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            StoreConfig::from_str("history_limit = \"many\""),
            Err(ConfigError::Toml(_))
        ));
    }
}
