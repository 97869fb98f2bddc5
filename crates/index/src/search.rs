use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use embedding::{Embedding, EmbeddingsClient};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::item::CatalogItem;
use crate::similarity::cosine_similarity;
use crate::store::VectorStore;


pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MIN_PAGE_SIZE: usize = 1;
pub const MAX_PAGE_SIZE: usize = 50;

/// Final ordering of a result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Similarity, highest first.
    #[default]
    Score,
    /// Price, lowest first. Ties keep their similarity order.
    Price,
}

impl FromStr for SortKey {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score" => Ok(SortKey::Score),
            "price" => Ok(SortKey::Price),
            other => Err(SearchError::InvalidSort(other.to_owned())),
        }
    }
}

/// Optional predicates. An absent bound does not filter anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
}

impl SearchFilters {
    /// Category compared case-insensitively; blank counts as unset.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        if let Some(category) = self.category.as_deref().map(str::trim) {
            if !category.is_empty() && item.category.to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        if self.price_min.is_some_and(|min| item.price < min) {
            return false;
        }
        if self.price_max.is_some_and(|max| item.price > max) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    pub page: usize,
    pub page_size: usize,
    pub sort: SortKey,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: SearchFilters::default(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortKey::Score,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.filters.category = Some(category.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.filters.price_min = min;
        self.filters.price_max = max;
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Checks the request against the public API limits.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(SearchError::PageSizeOutOfRange {
                min: MIN_PAGE_SIZE,
                max: MAX_PAGE_SIZE,
            });
        }
        if self.filters.price_min.is_some_and(|p| p < Decimal::ZERO) {
            return Err(SearchError::NegativePriceMin);
        }
        if self.filters.price_max.is_some_and(|p| p < Decimal::ZERO) {
            return Err(SearchError::NegativePriceMax);
        }
        if let (Some(min), Some(max)) = (self.filters.price_min, self.filters.price_max) {
            if min > max {
                return Err(SearchError::InvertedPriceRange);
            }
        }
        Ok(())
    }
}

/// A scored catalog item. The item fields are flattened when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub item: Arc<CatalogItem>,
    pub score: f64,
}

/// One page of ranked results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub items: Vec<SearchResult>,
    pub page: usize,
    pub size: usize,
    /// Matches across all pages, after filtering.
    pub total: usize,
    pub has_next: bool,
}

impl SearchPage {
    pub fn empty(page: usize, size: usize) -> Self {
        Self {
            items: Vec::new(),
            page,
            size,
            total: 0,
            has_next: false,
        }
    }
}

/// Brute-force semantic search over a [`VectorStore`].
#[derive(Debug, Clone)]
pub struct SearchEngine {
    client: Arc<EmbeddingsClient>,
    store: Arc<VectorStore>,
}

impl SearchEngine {
    pub fn new(client: Arc<EmbeddingsClient>, store: Arc<VectorStore>) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &Arc<EmbeddingsClient> {
        &self.client
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// Embeds the query, scores every embedded item, then filters, sorts and
    /// paginates. A query that cannot be embedded yields an empty page.
    pub async fn search(&self, request: &SearchRequest) -> SearchPage {
        let Some(query_embedding) = self.client.embed(&request.query).await else {
            tracing::warn!(
                query = %request.query,
                "query could not be embedded, returning no results"
            );
            return SearchPage::empty(request.page, request.page_size);
        };

        let scored = self.score_all(&query_embedding);
        let page = rank(scored, request);
        tracing::debug!(
            query = %request.query,
            total = page.total,
            returned = page.items.len(),
            page = page.page,
            "search completed"
        );
        page
    }

    /// Scores every item that has an embedding, highest similarity first.
    /// Equal scores keep load order.
    pub fn score_all(&self, query: &Embedding) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = self
            .store
            .embedded_items()
            .into_iter()
            .map(|(item, embedding)| SearchResult {
                score: cosine_similarity(query.as_slice(), embedding.as_slice()),
                item,
            })
            .collect();
        sort_by_score(&mut scored);
        scored
    }
}

/// Stable, descending by score.
pub fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Applies filters, the requested sort and pagination to results already in
/// score order.
pub fn rank(scored: Vec<SearchResult>, request: &SearchRequest) -> SearchPage {
    let mut filtered: Vec<SearchResult> = scored
        .into_iter()
        .filter(|r| request.filters.matches(&r.item))
        .collect();

    if request.sort == SortKey::Price {
        filtered.sort_by(|a, b| a.item.price.cmp(&b.item.price));
    }

    paginate(filtered, request.page, request.page_size)
}

/// Slices page `page` of `size` out of `results`.
pub fn paginate(results: Vec<SearchResult>, page: usize, size: usize) -> SearchPage {
    let total = results.len();
    if size == 0 {
        return SearchPage {
            total,
            ..SearchPage::empty(page, size)
        };
    }

    let start = page.saturating_mul(size);
    if start >= total {
        return SearchPage {
            total,
            ..SearchPage::empty(page, size)
        };
    }

    let end = start.saturating_add(size).min(total);
    let items = results.into_iter().skip(start).take(end - start).collect();
    SearchPage {
        items,
        page,
        size,
        total,
        has_next: start.saturating_add(size) < total,
    }
}
