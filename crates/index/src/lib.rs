//! Catalog storage and brute-force semantic search.
//!
//! The catalog is small enough to scan linearly, so there is no ANN structure
//! here. [`VectorStore`] keeps items and their embeddings in sharded concurrent
//! maps. [`SearchEngine`] embeds the query through the shared
//! [`EmbeddingsClient`](embedding::EmbeddingsClient), scores every embedded
//! item by cosine similarity and then filters, sorts and paginates.
//!
//! Ranking is reproducible: the store hands out items in load order and every
//! sort is stable, so equal scores always come back in the same order.

mod error;
mod item;
mod search;
mod similarity;
mod store;

pub use error::SearchError;
pub use item::CatalogItem;
pub use search::{
    paginate, rank, sort_by_score, SearchEngine, SearchFilters, SearchPage, SearchRequest,
    SearchResult, SortKey, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE,
};
pub use similarity::cosine_similarity;
pub use store::{EmbeddingSample, VectorStore, EMBEDDING_PREVIEW_LEN};

pub use rust_decimal::Decimal;
pub use uuid::Uuid;
