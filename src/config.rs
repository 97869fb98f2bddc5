//! YAML configuration file support.
//!
//! One file describes the whole service: where the catalog and evaluation
//! queries live, how the embedding client behaves and how strict the rate
//! limiter is. Every section is optional and falls back to defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! catalog_path: "data/products.csv"
//! eval_queries_path: "eval/queries.json"
//!
//! embedding:
//!   provider: "gemini"
//!   model: "text-embedding-004"
//!   base_url: "https://generativelanguage.googleapis.com"
//!   batch_size: 100
//!   cache_capacity: 500
//!   connect_timeout_ms: 5000
//!   read_timeout_ms: 30000
//!   retry:
//!     enabled: true
//!     backoff_ms: 0
//!
//! rate_limit:
//!   window_secs: 60
//!   max_requests: 30
//!   purge_interval_secs: 60
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use embedding::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rate_limit::RateLimitConfig;

/// Environment variable consulted when the file carries no API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSearchConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    #[serde(default = "default_eval_queries_path")]
    pub eval_queries_path: PathBuf,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for CatalogSearchConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            catalog_path: default_catalog_path(),
            eval_queries_path: default_eval_queries_path(),
            embedding: EmbeddingConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl CatalogSearchConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: CatalogSearchConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Fills the API key from the environment when the file did not set one.
    pub fn with_env_api_key(mut self) -> Self {
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.embedding
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("embedding: {e}")))?;

        if self.rate_limit.window_secs == 0 {
            return Err(ConfigLoadError::Validation(
                "rate_limit.window_secs must be >= 1".to_string(),
            ));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigLoadError::Validation(
                "rate_limit.max_requests must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/products.csv")
}

fn default_eval_queries_path() -> PathBuf {
    PathBuf::from("eval/queries.json")
}
