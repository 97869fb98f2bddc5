use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use embedding::Embedding;
use serde::Serialize;
use uuid::Uuid;

use crate::item::CatalogItem;

/// Number of leading values returned as a preview with sampled embeddings.
pub const EMBEDDING_PREVIEW_LEN: usize = 10;

#[derive(Debug)]
struct Slot {
    /// Load sequence; snapshots are ordered by it.
    seq: u64,
    item: Arc<CatalogItem>,
}

/// Sampled embedding as exposed for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSample {
    pub product_id: Uuid,
    pub dimension: usize,
    pub vector: Vec<f64>,
    pub preview: Vec<f64>,
}

/// Concurrent catalog store with an attached embedding table.
///
/// Both tables are sharded maps, so writers on different ids do not contend.
/// Snapshots come back in load order, which keeps search ties reproducible.
#[derive(Debug, Default)]
pub struct VectorStore {
    items: DashMap<Uuid, Slot>,
    embeddings: DashMap<Uuid, Embedding>,
    next_seq: AtomicU64,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `item`, or replaces the item with the same id while keeping its
    /// original position. Returns the replaced item.
    pub fn upsert(&self, item: CatalogItem) -> Option<Arc<CatalogItem>> {
        match self.items.entry(item.id) {
            Entry::Occupied(mut occupied) => {
                let previous = std::mem::replace(&mut occupied.get_mut().item, Arc::new(item));
                Some(previous)
            }
            Entry::Vacant(vacant) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                vacant.insert(Slot {
                    seq,
                    item: Arc::new(item),
                });
                None
            }
        }
    }

    /// Snapshot of every item in load order.
    pub fn all(&self) -> Vec<Arc<CatalogItem>> {
        self.ordered_slots()
            .into_iter()
            .map(|(_, item)| item)
            .collect()
    }

    /// First `limit` items in load order.
    pub fn all_limited(&self, limit: usize) -> Vec<Arc<CatalogItem>> {
        let mut items = self.all();
        items.truncate(limit);
        items
    }

    pub fn by_id(&self, id: &Uuid) -> Option<Arc<CatalogItem>> {
        self.items.get(id).map(|slot| Arc::clone(&slot.item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn set_embedding(&self, id: Uuid, embedding: Embedding) {
        self.embeddings.insert(id, embedding);
    }

    pub fn get_embedding(&self, id: &Uuid) -> Option<Embedding> {
        self.embeddings.get(id).map(|e| e.clone())
    }

    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }

    /// Items that have an embedding, paired with it, in load order.
    pub fn embedded_items(&self) -> Vec<(Arc<CatalogItem>, Embedding)> {
        self.ordered_slots()
            .into_iter()
            .filter_map(|(_, item)| {
                let embedding = self.get_embedding(&item.id)?;
                Some((item, embedding))
            })
            .collect()
    }

    /// Up to `limit` stored embeddings with their dimension and a short preview.
    pub fn sample_embeddings(&self, limit: usize) -> Vec<EmbeddingSample> {
        self.embedded_items()
            .into_iter()
            .take(limit)
            .map(|(item, embedding)| EmbeddingSample {
                product_id: item.id,
                dimension: embedding.dimension(),
                vector: embedding.to_f64_vec(),
                preview: embedding.preview(EMBEDDING_PREVIEW_LEN),
            })
            .collect()
    }

    fn ordered_slots(&self) -> Vec<(u64, Arc<CatalogItem>)> {
        let mut slots: Vec<(u64, Arc<CatalogItem>)> = self
            .items
            .iter()
            .map(|entry| (entry.seq, Arc::clone(&entry.item)))
            .collect();
        slots.sort_unstable_by_key(|(seq, _)| *seq);
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::thread;

    fn item(n: u128, sku: &str) -> CatalogItem {
        CatalogItem {
            id: Uuid::from_u128(n),
            sku: sku.into(),
            title: format!("Item {sku}"),
            description: String::new(),
            category: "Misc".into(),
            price: Decimal::new(n as i64 * 100, 2),
            tags: Vec::new(),
        }
    }

    #[test]
    fn upsert_and_lookup() {
        let store = VectorStore::new();
        assert!(store.upsert(item(1, "A")).is_none());
        assert_eq!(store.by_id(&Uuid::from_u128(1)).unwrap().sku, "A");
        assert!(store.by_id(&Uuid::from_u128(2)).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_keeps_load_position() {
        let store = VectorStore::new();
        store.upsert(item(1, "A"));
        store.upsert(item(2, "B"));
        let previous = store.upsert(item(1, "A2")).unwrap();

        assert_eq!(previous.sku, "A");
        let skus: Vec<_> = store.all().iter().map(|i| i.sku.clone()).collect();
        assert_eq!(skus, vec!["A2", "B"]);
    }

    #[test]
    fn snapshots_follow_load_order() {
        let store = VectorStore::new();
        for n in (1..=20).rev() {
            store.upsert(item(n, &format!("S{n}")));
        }
        let skus: Vec<_> = store.all_limited(3).iter().map(|i| i.sku.clone()).collect();
        assert_eq!(skus, vec!["S20", "S19", "S18"]);
        assert_eq!(store.all_limited(100).len(), 20);
    }

    #[test]
    fn items_without_embedding_are_not_embedded_items() {
        let store = VectorStore::new();
        store.upsert(item(1, "A"));
        store.upsert(item(2, "B"));
        store.set_embedding(Uuid::from_u128(2), Embedding::normalized(&[1.0, 0.0]));

        let embedded = store.embedded_items();
        assert_eq!(embedded.len(), 1);
        assert_eq!(embedded[0].0.sku, "B");
        assert_eq!(store.embedding_count(), 1);
        assert!(store.get_embedding(&Uuid::from_u128(1)).is_none());
    }

    #[test]
    fn sample_embeddings_have_preview() {
        let store = VectorStore::new();
        for n in 1..=3 {
            store.upsert(item(n, &format!("S{n}")));
            let raw: Vec<f64> = (0..16).map(|i| f64::from(i + n as i32)).collect();
            store.set_embedding(Uuid::from_u128(n), Embedding::normalized(&raw));
        }

        let samples = store.sample_embeddings(2);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].product_id, Uuid::from_u128(1));
        assert_eq!(samples[0].dimension, 16);
        assert_eq!(samples[0].vector.len(), 16);
        assert_eq!(samples[0].preview.len(), EMBEDDING_PREVIEW_LEN);
        assert_eq!(samples[0].preview[..], samples[0].vector[..EMBEDDING_PREVIEW_LEN]);
    }

    #[test]
    fn sample_serializes_camel_case() {
        let sample = EmbeddingSample {
            product_id: Uuid::nil(),
            dimension: 1,
            vector: vec![1.0],
            preview: vec![1.0],
        };
        let json = serde_json::to_value(sample).unwrap();
        assert!(json.get("productId").is_some());
    }

    #[test]
    fn concurrent_writers_on_disjoint_ids() {
        let store = Arc::new(VectorStore::new());
        let handles: Vec<_> = (0..8u128)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..100u128 {
                        let n = t * 1000 + i + 1;
                        store.upsert(item(n, &format!("S{n}")));
                        store.set_embedding(Uuid::from_u128(n), Embedding::normalized(&[1.0, 1.0]));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 800);
        assert_eq!(store.embedding_count(), 800);
        assert_eq!(store.embedded_items().len(), 800);
    }
}
