use std::collections::HashMap;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::fetch::header_map;
use crate::loader::DEFAULT_SCHEME_PREFIX;

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderSettings {
    /// Prefix stripped from image identifiers to get the retrieval URI
    #[serde(default = "default_scheme_prefix")]
    pub scheme_prefix: String,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            scheme_prefix: default_scheme_prefix(),
        }
    }
}

impl LoaderSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheme_prefix.is_empty() {
            return Err(ConfigError::EmptySchemePrefix);
        }
        Ok(())
    }
}

fn default_scheme_prefix() -> String {
    DEFAULT_SCHEME_PREFIX.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extra headers sent with every frame request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            headers: HashMap::new(),
        }
    }
}

impl HttpSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        header_map(&self.headers).map_err(ConfigError::InvalidHeader)?;
        Ok(())
    }
}

fn default_user_agent() -> String {
    concat!("wado-loader/", env!("CARGO_PKG_VERSION")).to_string()
}
