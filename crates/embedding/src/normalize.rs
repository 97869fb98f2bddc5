/// In-place L2 normalization. Vectors with zero magnitude are left untouched
/// so degenerate provider output never turns into NaNs.
pub(crate) fn l2_normalize_in_place(v: &mut [f64]) {
    let norm_sq: f64 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

/// Euclidean length of a stored vector, accumulated in f64.
pub(crate) fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_simple_vector() {
        let mut v = vec![3.0f64, 4.0];
        l2_normalize_in_place(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn l2_normalize_zero_vector_is_guarded() {
        let mut v = vec![0.0f64; 4];
        l2_normalize_in_place(&mut v);
        assert_eq!(v, vec![0.0; 4]);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn l2_normalize_negative_values() {
        let mut v = vec![-3.0f64, -4.0];
        l2_normalize_in_place(&mut v);
        assert!((v[0] + 0.6).abs() < 1e-12);
        assert!((v[1] + 0.8).abs() < 1e-12);
    }

    #[test]
    fn l2_normalize_is_idempotent() {
        let mut v: Vec<f64> = (1..=16).map(f64::from).collect();
        l2_normalize_in_place(&mut v);
        let once = v.clone();
        l2_normalize_in_place(&mut v);
        for (a, b) in once.iter().zip(&v) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn l2_norm_of_unit_vector() {
        assert!((l2_norm(&[0.6, 0.8]) - 1.0).abs() < 1e-6);
        assert_eq!(l2_norm(&[0.0, 0.0]), 0.0);
        assert_eq!(l2_norm(&[]), 0.0);
    }
}
