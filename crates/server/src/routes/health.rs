use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (liveness)
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "catalog-search-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness check endpoint
///
/// Ready once the catalog is loaded. Items without embeddings do not block
/// readiness; they are just not searchable.
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let store = state.search.store();
    let client = state.search.client();
    let stats = client.stats();

    Ok(Json(json!({
        "status": "ready",
        "service": "catalog-search-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
        "catalog": {
            "items": store.len(),
            "embeddings": store.embedding_count(),
        },
        "embedding": {
            "provider": client.provider_name(),
            "model": client.model(),
            "cache_size": client.cache().size(),
            "cache_capacity": client.cache().capacity(),
            "cache_hits": stats.hits,
            "cache_misses": stats.misses,
        },
        "rate_limit": {
            "max_requests": state.search.limiter().max_requests(),
            "window_secs": state.search.limiter().window_secs(),
            "tracked_clients": state.search.limiter().tracked_clients(),
        }
    })))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    if !state.config.metrics_enabled {
        return Err(ServerError::NotFound);
    }
    let handle = state.metrics.as_ref().ok_or(ServerError::NotFound)?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
