//! Umbrella crate for catalog semantic search.
//!
//! Wires the embedding client, the vector store and the search engine into a
//! single [`CatalogSearch`] service, and owns the pieces that sit around it:
//! the YAML configuration file, the CSV catalog loader, per-client rate
//! limiting and the offline relevance evaluation.

pub mod config;
pub mod eval;
pub mod loader;
pub mod rate_limit;

pub use config::{API_KEY_ENV, CatalogSearchConfig, ConfigLoadError};
pub use eval::{
    DEFAULT_EVAL_K, EvalError, EvalQuery, EvalReport, QueryResult, evaluate, load_queries,
    precision_at_k,
};
pub use loader::{CatalogError, RowError, load_catalog, parse_catalog, parse_row};
pub use rate_limit::{RateLimitConfig, RateLimiter};

pub use embedding::{
    CacheStats, Embedding, EmbeddingCache, EmbeddingConfig, EmbeddingError, EmbeddingProvider,
    EmbeddingsClient, GeminiProvider, ProviderFailure, ProviderKind, ProviderResult, RetryConfig,
    StubProvider,
};
pub use index::{
    CatalogItem, DEFAULT_PAGE_SIZE, Decimal, EMBEDDING_PREVIEW_LEN, EmbeddingSample,
    MAX_PAGE_SIZE, MIN_PAGE_SIZE, SearchEngine, SearchError, SearchFilters, SearchPage,
    SearchRequest, SearchResult, SortKey, Uuid, VectorStore,
};

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

/// Outcome of loading items into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub items: usize,
    pub embedded: usize,
}

/// The assembled search service.
#[derive(Debug, Clone)]
pub struct CatalogSearch {
    client: Arc<EmbeddingsClient>,
    store: Arc<VectorStore>,
    engine: SearchEngine,
    limiter: Arc<RateLimiter>,
}

impl CatalogSearch {
    pub fn new(client: Arc<EmbeddingsClient>, rate_limit: RateLimitConfig) -> Self {
        let store = Arc::new(VectorStore::new());
        let engine = SearchEngine::new(Arc::clone(&client), Arc::clone(&store));
        Self {
            client,
            store,
            engine,
            limiter: Arc::new(RateLimiter::new(rate_limit)),
        }
    }

    /// Builds the service from configuration. Nothing is loaded yet.
    pub fn from_config(config: &CatalogSearchConfig) -> Result<Self, EmbeddingError> {
        let client = EmbeddingsClient::from_config(&config.embedding)?;
        tracing::info!(
            provider = client.provider_name(),
            model = client.model(),
            "embedding client ready"
        );
        Ok(Self::new(Arc::new(client), config.rate_limit))
    }

    pub fn client(&self) -> &Arc<EmbeddingsClient> {
        &self.client
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Reads the catalog CSV and indexes it.
    pub async fn load_catalog<P: AsRef<Path>>(&self, path: P) -> Result<IndexSummary, CatalogError> {
        let items = load_catalog(path)?;
        Ok(self.index_items(items).await)
    }

    /// Stores every item, then embeds them all in one batch. Items whose
    /// embedding fails stay in the catalog but are not searchable.
    pub async fn index_items(&self, items: Vec<CatalogItem>) -> IndexSummary {
        let started = Instant::now();
        let texts: Vec<String> = items.iter().map(CatalogItem::embedding_text).collect();
        let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        for item in items {
            self.store.upsert(item);
        }

        if ids.is_empty() {
            tracing::warn!("catalog is empty, skipping embedding generation");
            return IndexSummary {
                items: self.store.len(),
                embedded: 0,
            };
        }

        let embeddings = self.client.embed_batch_aligned(&texts).await;
        let mut embedded = 0;
        for (id, embedding) in ids.iter().zip(embeddings) {
            if let Some(embedding) = embedding {
                self.store.set_embedding(*id, embedding);
                embedded += 1;
            }
        }

        let summary = IndexSummary {
            items: self.store.len(),
            embedded,
        };
        if embedded < ids.len() {
            tracing::warn!(
                missing = ids.len() - embedded,
                "some items have no embedding and are excluded from search"
            );
        }
        tracing::info!(
            items = summary.items,
            embedded = summary.embedded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "catalog indexed"
        );
        summary
    }

    /// Validates and runs a search.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        request.validate()?;
        metrics::counter!("search_requests_total").increment(1);
        Ok(self.engine.search(request).await)
    }

    pub async fn evaluate(&self, queries: &[EvalQuery], k: usize) -> Result<EvalReport, EvalError> {
        evaluate(&self.engine, queries, k).await
    }
}
