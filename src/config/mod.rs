//! Loader configuration, read from TOML.
//!
//! Every section is optional; missing values fall back to defaults.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

mod loader_config;
mod logging_config;

pub use loader_config::{HttpSettings, LoaderSettings};
pub use logging_config::LoggingConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Scheme prefix must not be empty")]
    EmptySchemePrefix,

    #[error("Invalid HTTP header: {0}")]
    InvalidHeader(String),

    #[error("log_file_path is required when log_to_file is enabled")]
    MissingLogFilePath,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub loader: LoaderSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.loader.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
