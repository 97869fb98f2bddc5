//! Bounded LRU cache for embeddings.
//!
//! Recency is refreshed by both `get` hits and `put`, so a hit needs exclusive
//! access to the LRU list. `size` and `contains` only read and can run
//! alongside each other.

use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock};

use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::types::Embedding;

/// Thread-safe key to embedding cache with least-recently-used eviction.
#[derive(Debug)]
pub struct EmbeddingCache {
    inner: RwLock<LruCache<String, Embedding>>,
}

impl EmbeddingCache {
    /// Creates a cache holding at most `capacity` entries. A capacity of zero is
    /// treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached embedding and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<Embedding> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.get(key).cloned()
    }

    /// Inserts or replaces an entry, evicting the least recently used one when full.
    pub fn put(&self, key: String, value: Embedding) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.put(key, value);
    }

    /// Membership check that leaves recency untouched.
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn size(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn capacity(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
            .get()
    }

    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Derives the cache key for `text` under a given provider and model.
///
/// The key is the lowercase hex SHA-256 of `provider:model:text`, so switching
/// models never serves vectors computed by another model.
pub fn cache_key(provider: &str, model: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(provider.as_bytes());
    hasher.update(b":");
    hasher.update(model.as_bytes());
    hasher.update(b":");
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
