use async_trait::async_trait;

use crate::error::ProviderFailure;

/// Raw, not yet normalized vectors in request order, or a tagged failure.
pub type ProviderResult = Result<Vec<Vec<f64>>, ProviderFailure>;

/// A remote (or local) source of raw embedding vectors.
///
/// One call covers one batch. Implementations return exactly one vector per
/// input text, in input order, or fail the whole batch.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable provider label, part of the cache key.
    fn name(&self) -> &str;

    /// Model identifier, part of the cache key.
    fn model(&self) -> &str;

    async fn embed_texts(&self, texts: &[String]) -> ProviderResult;
}
