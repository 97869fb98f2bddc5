use thiserror::Error;

/// Rejections for malformed search requests.
///
/// The messages are user-facing; the HTTP layer returns them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Query parameter 'q' is required and cannot be empty")]
    EmptyQuery,
    #[error("Page parameter must be non-negative")]
    NegativePage,
    #[error("Size parameter must be between {min} and {max}")]
    PageSizeOutOfRange { min: usize, max: usize },
    #[error("Sort parameter must be 'score' or 'price'")]
    InvalidSort(String),
    #[error("PriceMin must be non-negative")]
    NegativePriceMin,
    #[error("PriceMax must be non-negative")]
    NegativePriceMax,
    #[error("PriceMin cannot be greater than priceMax")]
    InvertedPriceRange,
}
