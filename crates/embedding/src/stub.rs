use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::provider::{EmbeddingProvider, ProviderResult};

/// Deterministic offline provider.
///
/// Each lowercase alphanumeric token is hashed into one of `dimension` buckets
/// and counted, so texts sharing words end up with positive cosine similarity.
/// Text without any token maps to the zero vector. Never fails.
#[derive(Debug, Clone)]
pub struct StubProvider {
    model: String,
    dimension: usize,
}

impl StubProvider {
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Raw (unnormalized) bag-of-words vector for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f64> {
        let mut v = vec![0.0; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            v[bucket(&token, self.dimension)] += 1.0;
        }
        v
    }
}

fn bucket(token: &str, dimension: usize) -> usize {
    let digest = Sha256::digest(token.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_le_bytes(prefix) % dimension as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_texts(&self, texts: &[String]) -> ProviderResult {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}
