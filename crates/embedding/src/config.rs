use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::retry::RetryConfig;

/// Which transport produces raw vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini `batchEmbedContents`.
    #[default]
    Gemini,
    /// Offline hashed bag-of-words vectors.
    Stub,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Stub => "stub",
        }
    }
}

/// Tunables for [`EmbeddingsClient`](crate::EmbeddingsClient) and its provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    /// Credential attached to every provider call. Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Largest number of texts sent in one provider call.
    pub batch_size: usize,
    pub cache_capacity: usize,
    #[serde(rename = "connect_timeout_ms", with = "crate::serde_millis")]
    pub connect_timeout: Duration,
    #[serde(rename = "read_timeout_ms", with = "crate::serde_millis")]
    pub read_timeout: Duration,
    pub retry: RetryConfig,
    /// Vector length produced by the stub provider.
    pub stub_dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: "text-embedding-004".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: None,
            batch_size: 100,
            cache_capacity: 500,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            stub_dimension: 64,
        }
    }
}

impl EmbeddingConfig {
    /// Offline configuration backed by the stub provider.
    pub fn stub() -> Self {
        Self {
            provider: ProviderKind::Stub,
            model: "stub-bow".into(),
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.batch_size == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "cache_capacity must be at least 1".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig("model must not be empty".into()));
        }
        if self.provider == ProviderKind::Stub && self.stub_dimension == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "stub_dimension must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provider_limits() {
        let cfg = EmbeddingConfig::default();
        assert_eq!(cfg.provider, ProviderKind::Gemini);
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.cache_capacity, 500);
        assert_eq!(cfg.connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.read_timeout, Duration::from_secs(30));
        assert!(cfg.retry.enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: EmbeddingConfig = serde_json::from_str(
            r#"{"provider":"stub","batch_size":8,"read_timeout_ms":1500,"retry":{"enabled":false}}"#,
        )
        .unwrap();
        assert_eq!(cfg.provider, ProviderKind::Stub);
        assert_eq!(cfg.batch_size, 8);
        assert_eq!(cfg.read_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(5));
        assert!(!cfg.retry.enabled);
        assert_eq!(cfg.model, "text-embedding-004");
    }

    #[test]
    fn api_key_is_not_serialized() {
        let cfg = EmbeddingConfig::default().with_api_key("secret");
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"connect_timeout_ms\":5000"));
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        assert!(EmbeddingConfig::default()
            .with_batch_size(0)
            .validate()
            .is_err());
        assert!(EmbeddingConfig::default()
            .with_cache_capacity(0)
            .validate()
            .is_err());
    }
}
