use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::api::GeminiProvider;
use crate::cache::{cache_key, EmbeddingCache};
use crate::config::{EmbeddingConfig, ProviderKind};
use crate::error::{EmbeddingError, ProviderFailure};
use crate::provider::EmbeddingProvider;
use crate::retry::{execute_with_retry, RetryConfig};
use crate::stub::StubProvider;
use crate::types::Embedding;

/// Hit/miss counters since the client was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache-first, batching, retrying front for an [`EmbeddingProvider`].
///
/// Provider failures never escape: texts whose batch failed simply get no
/// embedding.
pub struct EmbeddingsClient {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<EmbeddingCache>,
    batch_size: usize,
    retry: RetryConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for EmbeddingsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsClient")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("batch_size", &self.batch_size)
            .field("retry", &self.retry)
            .field("cache_size", &self.cache.size())
            .finish()
    }
}

impl EmbeddingsClient {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: Arc<EmbeddingCache>,
        batch_size: usize,
        retry: RetryConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            batch_size: batch_size.max(1),
            retry,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Builds the configured provider plus a fresh cache.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;
        let provider: Arc<dyn EmbeddingProvider> = match config.provider {
            ProviderKind::Gemini => Arc::new(GeminiProvider::new(config)?),
            ProviderKind::Stub => {
                Arc::new(StubProvider::new(config.model.clone(), config.stub_dimension))
            }
        };
        let cache = Arc::new(EmbeddingCache::new(config.cache_capacity));
        Ok(Self::new(provider, cache, config.batch_size, config.retry))
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn cache_key(&self, text: &str) -> String {
        cache_key(self.provider.name(), self.provider.model(), text)
    }

    /// Embeds one text. `None` means no embedding is available.
    pub async fn embed(&self, text: &str) -> Option<Embedding> {
        self.embed_batch_aligned(&[text.to_owned()])
            .await
            .pop()
            .flatten()
    }

    /// Embeds `texts`, keeping input order but dropping texts that could not be
    /// embedded. The output may therefore be shorter than the input.
    pub async fn embed_batch(&self, texts: &[String]) -> Vec<Embedding> {
        self.embed_batch_aligned(texts)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Like [`embed_batch`](Self::embed_batch) but positionally aligned: slot
    /// `i` holds the embedding for `texts[i]` or `None`.
    pub async fn embed_batch_aligned(&self, texts: &[String]) -> Vec<Option<Embedding>> {
        let mut out: Vec<Option<Embedding>> = vec![None; texts.len()];
        let mut pending: Vec<(usize, String)> = Vec::new();

        for (idx, text) in texts.iter().enumerate() {
            let key = self.cache_key(text);
            match self.cache.get(&key) {
                Some(hit) => {
                    self.record_hit();
                    out[idx] = Some(hit);
                }
                None => {
                    self.record_miss();
                    pending.push((idx, key));
                }
            }
        }

        if pending.is_empty() {
            return out;
        }

        tracing::debug!(
            requested = texts.len(),
            uncached = pending.len(),
            batch_size = self.batch_size,
            "embedding uncached texts"
        );

        // Chunks go out one after another.
        for chunk in pending.chunks(self.batch_size) {
            let chunk_texts: Vec<String> = chunk.iter().map(|(idx, _)| texts[*idx].clone()).collect();

            match self.call_provider(&chunk_texts).await {
                Ok(vectors) => {
                    for ((idx, key), raw) in chunk.iter().zip(vectors) {
                        if raw.is_empty() {
                            continue;
                        }
                        let embedding = Embedding::normalized(&raw);
                        self.cache.put(key.clone(), embedding.clone());
                        out[*idx] = Some(embedding);
                    }
                }
                Err(failure) => {
                    metrics::counter!("embedding_provider_failures_total", "kind" => failure.kind())
                        .increment(1);
                    match &failure {
                        ProviderFailure::Transient(_) => tracing::warn!(
                            texts = chunk.len(),
                            error = %failure,
                            "embedding batch dropped after transient failure"
                        ),
                        ProviderFailure::Permanent(_) => tracing::error!(
                            texts = chunk.len(),
                            error = %failure,
                            "embedding batch dropped after permanent failure"
                        ),
                    }
                }
            }
        }

        out
    }

    async fn call_provider(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ProviderFailure> {
        let outcome = execute_with_retry(&self.retry, |attempt| {
            tracing::debug!(
                attempt,
                texts = texts.len(),
                provider = self.provider.name(),
                "calling embedding provider"
            );
            self.provider.embed_texts(texts)
        })
        .await;
        tracing::debug!(
            attempts = outcome.attempts,
            elapsed_ms = outcome.total_duration.as_millis() as u64,
            succeeded = outcome.succeeded(),
            "embedding provider call finished"
        );
        outcome.into_result()
    }

    fn record_hit(&self) {
        let hits = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::counter!("embedding_cache_hits_total").increment(1);
        tracing::debug!(hits, misses = self.misses.load(Ordering::Relaxed), "embedding cache hit");
    }

    fn record_miss(&self) {
        let misses = self.misses.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::counter!("embedding_cache_misses_total").increment(1);
        tracing::debug!(hits = self.hits.load(Ordering::Relaxed), misses, "embedding cache miss");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderResult;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted results, then falls back to echoing `[len, 1.0]` vectors.
    #[derive(Default)]
    struct ScriptedProvider {
        script: Mutex<VecDeque<ProviderResult>>,
        calls: AtomicU64,
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl ScriptedProvider {
        fn with_script(results: Vec<ProviderResult>) -> Self {
            Self {
                script: Mutex::new(results.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "test-model"
        }

        async fn embed_texts(&self, texts: &[String]) -> ProviderResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(texts.len());
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                return next;
            }
            Ok(texts.iter().map(|t| vec![t.len() as f64, 1.0]).collect())
        }
    }

    fn client(provider: Arc<ScriptedProvider>, batch_size: usize, retry: RetryConfig) -> EmbeddingsClient {
        EmbeddingsClient::new(provider, Arc::new(EmbeddingCache::new(100)), batch_size, retry)
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn second_embed_is_served_from_cache() {
        let provider = Arc::new(ScriptedProvider::default());
        let client = client(provider.clone(), 100, RetryConfig::default());

        let first = client.embed("wireless mouse").await.unwrap();
        let second = client.embed("wireless mouse").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
        assert_eq!(client.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn returned_vectors_are_unit_length() {
        let provider = Arc::new(ScriptedProvider::default());
        let client = client(provider, 100, RetryConfig::default());
        for e in client.embed_batch(&texts(&["a", "bb", "ccc"])).await {
            assert!((e.norm() - 1.0).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn zero_vector_from_provider_is_kept_as_zero() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![Ok(vec![vec![0.0, 0.0, 0.0]])]));
        let client = client(provider, 100, RetryConfig::default());
        let e = client.embed("nothing").await.unwrap();
        assert!(e.is_zero());
        assert_eq!(e.dimension(), 3);
    }

    #[tokio::test]
    async fn uncached_texts_are_chunked_by_batch_size() {
        let provider = Arc::new(ScriptedProvider::default());
        let client = client(provider.clone(), 2, RetryConfig::default());

        let out = client.embed_batch(&texts(&["a", "b", "c", "d", "e"])).await;

        assert_eq!(out.len(), 5);
        assert_eq!(provider.calls(), 3);
        assert_eq!(*provider.batch_sizes.lock().unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn cached_texts_skip_the_provider() {
        let provider = Arc::new(ScriptedProvider::default());
        let client = client(provider.clone(), 100, RetryConfig::default());
        client.embed("b").await.unwrap();

        let out = client.embed_batch_aligned(&texts(&["a", "b", "c"])).await;

        assert!(out.iter().all(Option::is_some));
        assert_eq!(*provider.batch_sizes.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn transient_failure_retries_once_and_recovers() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![Err(
            ProviderFailure::Transient("HTTP error 500".into()),
        )]));
        let client = client(provider.clone(), 100, RetryConfig::default());

        let e = client.embed("laptop").await;

        assert!(e.is_some());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn second_transient_failure_degrades_to_empty() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![
            Err(ProviderFailure::Transient("HTTP error 503".into())),
            Err(ProviderFailure::Transient("HTTP error 503".into())),
        ]));
        let client = client(provider.clone(), 100, RetryConfig::default());

        assert!(client.embed("laptop").await.is_none());
        assert_eq!(provider.calls(), 2);
        assert_eq!(client.cache().size(), 0);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![Err(
            ProviderFailure::Permanent("HTTP error 400".into()),
        )]));
        let client = client(provider.clone(), 100, RetryConfig::default());

        assert!(client.embed("laptop").await.is_none());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn disabled_retry_makes_single_call() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![Err(
            ProviderFailure::Transient("HTTP error 500".into()),
        )]));
        let client = client(provider.clone(), 100, RetryConfig::disabled());

        assert!(client.embed("laptop").await.is_none());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn failed_chunk_shortens_batch_output() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![
            Ok(vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
            Err(ProviderFailure::Permanent("HTTP error 400".into())),
        ]));
        let client = client(provider.clone(), 2, RetryConfig::default());
        let input = texts(&["a", "b", "c", "d"]);

        let aligned = client.embed_batch_aligned(&input).await;
        assert!(aligned[0].is_some() && aligned[1].is_some());
        assert!(aligned[2].is_none() && aligned[3].is_none());

        // a and b are cached now; c and d hit the echo fallback.
        let dense = client.embed_batch(&input).await;
        assert_eq!(dense.len(), 4);
    }

    #[tokio::test]
    async fn empty_vectors_are_dropped() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![Ok(vec![
            vec![1.0, 1.0],
            vec![],
            vec![2.0, 0.0],
        ])]));
        let client = client(provider, 100, RetryConfig::default());

        let out = client.embed_batch(&texts(&["x", "y", "z"])).await;

        assert_eq!(out.len(), 2);
        assert!((out[1].as_slice()[0] - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let provider = Arc::new(ScriptedProvider::default());
        let client = client(provider.clone(), 100, RetryConfig::default());
        assert!(client.embed_batch(&[]).await.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn from_config_builds_stub_client() {
        let client = EmbeddingsClient::from_config(&EmbeddingConfig::stub().with_cache_capacity(7)).unwrap();
        assert_eq!(client.provider_name(), "stub");
        assert_eq!(client.cache().capacity(), 7);
    }

    #[test]
    fn from_config_rejects_invalid() {
        let err = EmbeddingsClient::from_config(&EmbeddingConfig::stub().with_batch_size(0)).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidConfig(_)));
    }

    #[test]
    fn hit_rate() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
        assert_eq!(CacheStats { hits: 3, misses: 1 }.hit_rate(), 0.75);
    }
}
