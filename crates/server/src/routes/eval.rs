use crate::error::{ServerError, ServerResult};
use crate::routes::parse_param;
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::Json;
use catalog_search::{load_queries, EvalError, EvalReport, DEFAULT_EVAL_K};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct EvalParams {
    pub k: Option<String>,
}

/// `GET /eval`: runs the labelled queries against the live engine.
pub async fn run_eval(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<EvalParams>,
) -> ServerResult<Json<EvalReport>> {
    let k = parse_param::<i64>("k", params.k.as_deref())?.unwrap_or(DEFAULT_EVAL_K as i64);
    let k = usize::try_from(k).map_err(|_| ServerError::from(EvalError::InvalidK(0)))?;

    let path = state.eval_queries_path.clone();
    let queries = tokio::task::spawn_blocking(move || load_queries(path))
        .await
        .map_err(|e| ServerError::Internal(format!("query loader panicked: {e}")))??;

    let report = state.search.evaluate(&queries, k).await?;
    tracing::info!(
        k,
        queries = report.total_queries,
        average_precision = report.average_precision,
        "evaluation finished"
    );
    Ok(Json(report))
}
