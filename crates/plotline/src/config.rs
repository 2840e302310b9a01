//! Combined configuration file for the `plotline` binary.

use serde::{Deserialize, Serialize};
use std::path::Path;

use extractor::ExtractorConfig;
use plot_core::{ConfigError, StoreConfig};

/// File read when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "plotline.toml";

/// `[store]` and `[extraction]` tables of `plotline.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotlineConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub extraction: ExtractorConfig,
}

impl PlotlineConfig {
    /// Loads an explicit file, else `plotline.toml` in the working
    /// directory if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
