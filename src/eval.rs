//! Offline relevance evaluation: precision@k over a labelled query set.

use std::fs;
use std::path::Path;

use index::{SearchEngine, SearchRequest, SortKey, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_EVAL_K: usize = 5;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to read evaluation queries {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse evaluation queries: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("k must be between 1 and {MAX_PAGE_SIZE}")]
    InvalidK(usize),
}

/// A labelled query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalQuery {
    pub query: String,
    #[serde(default)]
    pub expected_skus: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query: String,
    pub expected_skus: Vec<String>,
    pub actual_skus: Vec<String>,
    pub precision_at_k: f64,
    pub expected_count: usize,
    pub found_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalReport {
    pub results: Vec<QueryResult>,
    pub average_precision: f64,
    pub k: usize,
    pub total_queries: usize,
}

pub fn load_queries<P: AsRef<Path>>(path: P) -> Result<Vec<EvalQuery>, EvalError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| EvalError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// found / min(k, expected), or 0 when nothing is expected.
pub fn precision_at_k(expected: &[String], actual: &[String], k: usize) -> (f64, usize) {
    let found = expected.iter().filter(|sku| actual.contains(sku)).count();
    let denominator = k.min(expected.len());
    if denominator == 0 {
        return (0.0, found);
    }
    (found as f64 / denominator as f64, found)
}

/// Runs every query through `engine` and scores the top `k` results.
pub async fn evaluate(
    engine: &SearchEngine,
    queries: &[EvalQuery],
    k: usize,
) -> Result<EvalReport, EvalError> {
    if !(1..=MAX_PAGE_SIZE).contains(&k) {
        return Err(EvalError::InvalidK(k));
    }
    tracing::info!(k, queries = queries.len(), "running evaluation");

    let mut results = Vec::with_capacity(queries.len());
    for q in queries {
        let request = SearchRequest::new(q.query.clone())
            .with_page(0, k)
            .with_sort(SortKey::Score);
        let page = engine.search(&request).await;
        let actual_skus: Vec<String> = page.items.iter().map(|r| r.item.sku.clone()).collect();
        let (precision, found) = precision_at_k(&q.expected_skus, &actual_skus, k);

        tracing::debug!(query = %q.query, precision, found, "evaluated query");
        results.push(QueryResult {
            query: q.query.clone(),
            expected_skus: q.expected_skus.clone(),
            actual_skus,
            precision_at_k: precision,
            expected_count: q.expected_skus.len(),
            found_count: found,
        });
    }

    let average_precision = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.precision_at_k).sum::<f64>() / results.len() as f64
    };

    let report = EvalReport {
        total_queries: results.len(),
        results,
        average_precision,
        k,
    };
    log_table(&report);
    Ok(report)
}

fn log_table(report: &EvalReport) {
    let rule = "=".repeat(72);
    tracing::info!("{rule}");
    tracing::info!("EVALUATION RESULTS (k={})", report.k);
    tracing::info!(
        "{:<32} {:>9} {:>7} {:>13}",
        "Query",
        "Expected",
        "Found",
        format!("Precision@{}", report.k)
    );
    tracing::info!("{}", "-".repeat(72));
    for r in &report.results {
        tracing::info!(
            "{:<32} {:>9} {:>7} {:>13.4}",
            truncate(&r.query, 31),
            r.expected_count,
            r.found_count,
            r.precision_at_k
        );
    }
    tracing::info!("{}", "-".repeat(72));
    tracing::info!(
        "{:<32} {:>31.4}",
        format!("AVERAGE ({} queries)", report.total_queries),
        report.average_precision
    );
    tracing::info!("{rule}");
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_owned();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skus(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn precision_uses_smaller_of_k_and_expected() {
        let (p, found) = precision_at_k(&skus(&["A", "B"]), &skus(&["A", "X", "Y", "Z", "W"]), 5);
        assert_eq!(found, 1);
        assert!((p - 0.5).abs() < 1e-12);

        let expected = skus(&["A", "B", "C", "D", "E", "F", "G"]);
        let (p, found) = precision_at_k(&expected, &skus(&["A", "B", "C"]), 3);
        assert_eq!(found, 3);
        assert!((p - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_expected_skus_scores_zero() {
        assert_eq!(precision_at_k(&[], &skus(&["A"]), 5), (0.0, 0));
    }

    #[test]
    fn parses_camel_case_queries() {
        let json = r#"[{"query":"desk lamp","expectedSkus":["L-1","L-2"]},{"query":"mug"}]"#;
        let queries: Vec<EvalQuery> = serde_json::from_str(json).unwrap();
        assert_eq!(queries[0].expected_skus, skus(&["L-1", "L-2"]));
        assert!(queries[1].expected_skus.is_empty());
    }

    #[test]
    fn missing_queries_file_is_read_error() {
        assert!(matches!(
            load_queries("/no/such/queries.json"),
            Err(EvalError::Read { .. })
        ));
    }

    #[test]
    fn truncates_long_queries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long query text", 10), "a very ...");
    }
}
