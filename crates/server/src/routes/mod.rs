//! API route handlers
//!
//! - `search`: semantic search, rate limited per client
//! - `products`: catalog and embedding inspection
//! - `eval`: offline relevance evaluation against the live engine
//! - `health`: health checks, readiness, and metrics

pub mod eval;
pub mod health;
pub mod products;
pub mod search;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::str::FromStr;

/// API version and base info
///
/// # Response
///
/// ```json
/// {
///   "name": "Catalog Search Server",
///   "version": "0.1.0",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Catalog Search Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/search",
            "/products",
            "/products/embeddings",
            "/eval",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// Parses an optional query-string value. Blank counts as absent.
pub(crate) fn parse_param<T: FromStr>(name: &str, raw: Option<&str>) -> ServerResult<Option<T>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ServerError::invalid_parameter(name, value)),
    }
}

/// `limit` handling shared by the inspection routes: absent or ≤ 0 falls back
/// to `default`, anything above `max` is capped.
pub(crate) fn clamp_limit(raw: Option<i64>, default: usize, max: usize) -> usize {
    match raw {
        Some(n) if n > 0 => usize::try_from(n).map_or(max, |n| n.min(max)),
        _ => default,
    }
}
