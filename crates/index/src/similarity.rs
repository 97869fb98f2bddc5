/// Chunk width for the accumulation loop; keeps the inner loop auto-vectorizable.
const CHUNK: usize = 16;

/// Cosine similarity of two embeddings, accumulated in f64.
///
/// Returns 0.0 when either vector has zero magnitude.
///
/// # Panics
///
/// Panics when the lengths differ. Stored and query vectors of different
/// dimension mean two models got mixed up, and scoring them would be garbage.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "embedding dimension mismatch: {} vs {}",
        a.len(),
        b.len()
    );

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    let chunks_a = a.chunks_exact(CHUNK);
    let chunks_b = b.chunks_exact(CHUNK);
    let (rest_a, rest_b) = (chunks_a.remainder(), chunks_b.remainder());

    for (ca, cb) in chunks_a.zip(chunks_b) {
        let (d, na, nb) = accumulate(ca, cb);
        dot += d;
        norm_a += na;
        norm_b += nb;
    }
    let (d, na, nb) = accumulate(rest_a, rest_b);
    dot += d;
    norm_a += na;
    norm_b += nb;

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[inline]
fn accumulate(a: &[f32], b: &[f32]) -> (f64, f64, f64) {
    a.iter().zip(b).fold((0.0, 0.0, 0.0), |(d, na, nb), (&x, &y)| {
        let (x, y) = (f64::from(x), f64::from(y));
        (d + x * y, na + x * x, nb + y * y)
    })
}
