//! Catalog CSV loading.
//!
//! Expected header: `id,sku,title,description,category,price,tags`. Fields
//! may be wrapped in double quotes to carry commas; `""` inside a quoted
//! field is a literal quote. Rows that do not parse are logged and skipped.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use index::{CatalogItem, Decimal, Uuid};
use thiserror::Error;

const COLUMNS: usize = 7;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("expected {COLUMNS} columns, found {0}")]
    ColumnCount(usize),
    #[error("invalid id {0:?}")]
    InvalidId(String),
    #[error("invalid price {0:?}")]
    InvalidPrice(String),
}

/// Reads every parsable item from the CSV file at `path`.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogItem>, CatalogError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let items = parse_catalog(&content);
    tracing::info!(path = %path.display(), count = items.len(), "loaded catalog");
    Ok(items)
}

/// Parses catalog CSV text. The first line is treated as the header.
pub fn parse_catalog(content: &str) -> Vec<CatalogItem> {
    let mut items = Vec::new();
    for (line_no, line) in content.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Ok(item) => items.push(item),
            Err(err) => tracing::warn!(line = line_no + 1, error = %err, "skipping catalog row"),
        }
    }
    items
}

/// Parses one data row.
pub fn parse_row(line: &str) -> Result<CatalogItem, RowError> {
    let [raw_id, sku, title, description, category, raw_price, raw_tags]: [String; COLUMNS] =
        split_fields(line)
            .try_into()
            .map_err(|fields: Vec<String>| RowError::ColumnCount(fields.len()))?;

    let id = Uuid::parse_str(raw_id.trim()).map_err(|_| RowError::InvalidId(raw_id.clone()))?;
    let price =
        Decimal::from_str(raw_price.trim()).map_err(|_| RowError::InvalidPrice(raw_price.clone()))?;
    let tags = raw_tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(CatalogItem {
        id,
        sku: sku.trim().to_owned(),
        title,
        description,
        category: category.trim().to_owned(),
        price,
        tags,
    })
}

/// Splits on commas outside double quotes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::with_capacity(COLUMNS);
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            '\r' => {}
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
