//! Vector similarity math.

/// Cosine similarity between two vectors.
///
/// Returns `0.0` when either side is missing, the lengths differ, or either
/// vector has zero magnitude. Never fails.
pub fn cosine_similarity(a: Option<&[f32]>, b: Option<&[f32]>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 {
        return 0.0;
    }
    dot / magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(a: &[f32], b: &[f32]) -> f64 {
        cosine_similarity(Some(a), Some(b))
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3f32, -1.2, 4.0, 0.01];
        assert!((sim(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn symmetric() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [-0.5f32, 4.0, 0.25];
        assert_eq!(sim(&a, &b), sim(&b, &a));
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert!(sim(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
    }

    #[test]
    fn opposite_vectors_score_negative_one() {
        assert!((sim(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(sim(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(sim(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(sim(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(None, Some(&[1.0][..])), 0.0);
        assert_eq!(cosine_similarity(Some(&[1.0][..]), None), 0.0);
    }
}
