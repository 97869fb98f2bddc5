use thiserror::Error;

/// Errors raised while assembling an embeddings client.
///
/// Provider calls never surface these; they fail with [`ProviderFailure`]
/// and the client degrades instead.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Outcome tag of a failed provider call. Retry decisions branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    /// 5xx status, connect failure or timeout. Worth one more attempt.
    #[error("transient provider failure: {0}")]
    Transient(String),
    /// 4xx status or a response we cannot use. Retrying will not help.
    #[error("permanent provider failure: {0}")]
    Permanent(String),
}

impl ProviderFailure {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderFailure::Transient(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderFailure::Transient(_) => "transient",
            ProviderFailure::Permanent(_) => "permanent",
        }
    }
}
