use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One product in the catalog. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub sku: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CatalogItem {
    /// Text sent to the embedding provider for this item.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.description).trim().to_owned()
    }
}
