use crate::config::ServerConfig;
use catalog_search::{CatalogSearch, CatalogSearchConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Search service: embeddings client, store, engine and rate limiter
    pub search: CatalogSearch,

    /// Labelled queries used by `/eval`
    pub eval_queries_path: PathBuf,

    /// Prometheus renderer, present when a recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        search: CatalogSearch,
        catalog_config: &CatalogSearchConfig,
    ) -> Self {
        Self {
            config: Arc::new(config),
            search,
            eval_queries_path: catalog_config.eval_queries_path.clone(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Records one request from `client_id` against the rate limit.
    pub fn check_rate_limit(&self, client_id: &str) -> bool {
        self.search.limiter().is_allowed(client_id)
    }

    pub fn rate_limit(&self) -> u32 {
        self.search.limiter().max_requests()
    }
}
