use std::sync::Arc;

use crate::normalize::{l2_norm, l2_normalize_in_place};

/// A unit-length embedding vector.
///
/// Values are held as `f32` to keep the catalog footprint small and handed
/// out as `f64`. Cloning is cheap: the backing storage is shared, so the same
/// vector can sit in the cache and in the vector store at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    values: Arc<[f32]>,
}

impl Embedding {
    /// Builds an embedding from raw provider output, L2-normalizing it first.
    /// A zero vector stays zero.
    pub fn normalized(raw: &[f64]) -> Self {
        let mut scratch = raw.to_vec();
        l2_normalize_in_place(&mut scratch);
        Self {
            values: scratch.into_iter().map(|x| x as f32).collect(),
        }
    }

    /// Wraps values that are already in their final form.
    pub fn from_f32(values: Vec<f32>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Widened copy of the vector.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.values.iter().map(|&x| f64::from(x)).collect()
    }

    /// First `k` values (or fewer for short vectors).
    pub fn preview(&self, k: usize) -> Vec<f64> {
        self.values
            .iter()
            .take(k)
            .map(|&x| f64::from(x))
            .collect()
    }

    pub fn norm(&self) -> f64 {
        l2_norm(&self.values)
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&x| x == 0.0)
    }
}
