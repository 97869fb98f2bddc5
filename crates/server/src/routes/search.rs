use crate::error::{ServerError, ServerResult};
use crate::routes::parse_param;
use crate::state::ServerState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use catalog_search::{
    Decimal, SearchError, SearchPage, SearchRequest, SortKey, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    MIN_PAGE_SIZE,
};
use serde::Deserialize;
use std::sync::Arc;

/// Raw `/search` query string. Values are parsed by hand so malformed ones
/// map to `invalid_parameter` instead of a framework rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort: Option<String>,
}

impl SearchParams {
    /// Builds a validated request. Checks run in a fixed order and the first
    /// failure wins.
    pub fn into_request(self) -> ServerResult<SearchRequest> {
        let page = parse_param::<i64>("page", self.page.as_deref())?;
        let size = parse_param::<i64>("size", self.size.as_deref())?;
        let price_min = parse_param::<Decimal>("priceMin", self.price_min.as_deref())?;
        let price_max = parse_param::<Decimal>("priceMax", self.price_max.as_deref())?;

        let query = self.q.as_deref().map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery.into());
        }

        let page = page.unwrap_or(0);
        if page < 0 {
            return Err(SearchError::NegativePage.into());
        }

        let size = size.unwrap_or(DEFAULT_PAGE_SIZE as i64);
        if size < MIN_PAGE_SIZE as i64 || size > MAX_PAGE_SIZE as i64 {
            return Err(SearchError::PageSizeOutOfRange {
                min: MIN_PAGE_SIZE,
                max: MAX_PAGE_SIZE,
            }
            .into());
        }

        let sort: SortKey = self.sort.as_deref().unwrap_or("score").parse()?;

        let mut request = SearchRequest::new(query)
            .with_price_range(price_min, price_max)
            .with_page(page as usize, size as usize)
            .with_sort(sort);
        if let Some(category) = self.category {
            request = request.with_category(category);
        }
        request.validate()?;
        Ok(request)
    }
}

/// `GET /search`
pub async fn search(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ServerResult<Json<SearchPage>> {
    let Query(params) = params.map_err(|e| ServerError::invalid_parameter("query", &e.body_text()))?;
    let request = params.into_request()?;

    tracing::info!(
        q = %request.query,
        category = ?request.filters.category,
        price_min = ?request.filters.price_min,
        price_max = ?request.filters.price_max,
        page = request.page,
        size = request.page_size,
        sort = ?request.sort,
        "search request"
    );

    let page = state.search.search(&request).await?;

    tracing::info!(
        returned = page.items.len(),
        total = page.total,
        "search completed"
    );
    Ok(Json(page))
}
