//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Bootstrapping the search service and indexing the catalog
//! - Router configuration with all API endpoints
//! - Middleware stack (rate limiting, logging, compression, etc.)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::middleware::{log_requests, rate_limit, request_id};
use crate::routes::{api_info, not_found};
use crate::routes::{eval, health, products, search};
use crate::state::ServerState;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use catalog_search::{CatalogSearch, CatalogSearchConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any as CorsAny, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Only `/search` reaches the embedding provider, so only `/search` is rate
/// limited.
///
/// Middleware stack, outermost first:
/// 1. Tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression
/// 6. Timeout handling
/// 7. Panic recovery
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(CorsAny)
            .allow_methods(CorsAny)
            .allow_headers(CorsAny)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route("/products", get(products::list_products))
        .route("/products/embeddings", get(products::list_embeddings))
        .route("/eval", get(eval::run_eval));

    let limited_routes = Router::new()
        .route("/search", get(search::search))
        .route_layer(from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(public_routes)
        .merge(limited_routes)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ServerError::Internal(format!("handler panicked: {detail}")).into_response()
}

/// Assemble the search service: read the YAML config, build the embedding
/// client, load and index the catalog and start the rate-limit reclaimer.
///
/// A missing or unreadable catalog aborts startup. Embedding failures do
/// not; affected items are simply not searchable.
pub async fn bootstrap(config: ServerConfig) -> anyhow::Result<ServerState> {
    let catalog_config = match &config.config_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading search configuration");
            CatalogSearchConfig::from_file(path)?
        }
        None => CatalogSearchConfig::default(),
    }
    .with_env_api_key();

    let search = CatalogSearch::from_config(&catalog_config)?;
    let summary = search.load_catalog(&catalog_config.catalog_path).await?;
    if summary.embedded == 0 && summary.items > 0 {
        tracing::warn!("no catalog item could be embedded, search will return empty pages");
    }

    Arc::clone(search.limiter()).spawn_reclaimer(Duration::from_secs(
        catalog_config.rate_limit.purge_interval_secs,
    ));

    Ok(ServerState::new(config, search, &catalog_config))
}

/// Start the catalog search HTTP server
///
/// Blocks until the server is shut down via SIGTERM or Ctrl+C.
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    // installed before indexing so startup embedding counters are recorded
    let metrics = if config.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    let mut state = bootstrap(config.clone()).await?;
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let app = build_router(Arc::new(state));
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!("Starting catalog search server on {}", addr);
    tracing::info!("Timeout: {}s", config.timeout_secs);
    tracing::info!(
        "CORS: {}, Metrics: {}",
        config.enable_cors,
        config.metrics_enabled
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
