//! Catalog Search Server - HTTP REST API for semantic product search
//!
//! At startup the server loads the product catalog from CSV, embeds every
//! item through the configured provider and keeps the vectors in memory.
//! Each `/search` request embeds the query (cache first), scores the whole
//! catalog by cosine similarity, then filters, sorts and paginates.
//!
//! # Features
//!
//! - **Rate limiting**: fixed-window, per client (`X-Forwarded-For`,
//!   `X-Real-IP`, then peer address) on `/search`
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging,
//!   timeouts, panic recovery
//! - **Configuration**: `server.*` file, `CATALOG_SERVER__*` environment
//!   variables, `.env`, plus the YAML search configuration
//! - **Errors**: `{"error", "details", "status"}` JSON bodies
//! - **Graceful Shutdown**: SIGTERM and Ctrl+C
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /search?q=&category=&priceMin=&priceMax=&page=0&size=10&sort=score`
//! - `GET /products?limit=10` - First items of the catalog
//! - `GET /products/embeddings?limit=5` - Sampled embeddings with a preview
//! - `GET /eval?k=5` - Precision@k over the labelled queries
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe with catalog and cache counts
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, ServerError, ServerResult};
pub use server::{bootstrap, build_router, start_server};
pub use state::ServerState;
