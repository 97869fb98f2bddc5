use crate::error::ServerResult;
use crate::routes::{clamp_limit, parse_param};
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::Json;
use catalog_search::{CatalogItem, EmbeddingSample};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_PRODUCTS_LIMIT: usize = 10;
pub const MAX_PRODUCTS_LIMIT: usize = 100;
pub const DEFAULT_EMBEDDINGS_LIMIT: usize = 5;
pub const MAX_EMBEDDINGS_LIMIT: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Arc<CatalogItem>>,
    pub limit: usize,
    pub returned: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<EmbeddingSample>,
    pub limit: usize,
    pub returned: usize,
    /// Number of stored embeddings
    pub total: usize,
}

/// `GET /products`
pub async fn list_products(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<LimitQuery>,
) -> ServerResult<Json<ProductsResponse>> {
    let raw = parse_param::<i64>("limit", query.limit.as_deref())?;
    let limit = clamp_limit(raw, DEFAULT_PRODUCTS_LIMIT, MAX_PRODUCTS_LIMIT);

    let store = state.search.store();
    let products = store.all_limited(limit);
    let total = store.len();
    tracing::info!(limit, returned = products.len(), total, "listing products");

    Ok(Json(ProductsResponse {
        returned: products.len(),
        products,
        limit,
        total,
    }))
}

/// `GET /products/embeddings`
pub async fn list_embeddings(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<LimitQuery>,
) -> ServerResult<Json<EmbeddingsResponse>> {
    let raw = parse_param::<i64>("limit", query.limit.as_deref())?;
    let limit = clamp_limit(raw, DEFAULT_EMBEDDINGS_LIMIT, MAX_EMBEDDINGS_LIMIT);

    let store = state.search.store();
    let embeddings = store.sample_embeddings(limit);
    let total = store.embedding_count();
    tracing::info!(limit, returned = embeddings.len(), total, "listing embeddings");

    Ok(Json(EmbeddingsResponse {
        returned: embeddings.len(),
        embeddings,
        limit,
        total,
    }))
}
