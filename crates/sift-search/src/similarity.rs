//! Exact similarity scoring.

/// Added to the norm product so zero vectors score 0 instead of NaN.
pub const EPSILON: f64 = 1e-10;

/// Cosine similarity `dot(a, b) / (|a| * |b| + EPSILON)`, accumulated in f64.
///
/// Vectors of different length (or empty ones) score 0.
///
/// # Examples
///
/// ```
/// use sift_search::similarity::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt() + EPSILON)
}

/// Index of the highest score; the first one wins on ties.
///
/// # Examples
///
/// ```
/// use sift_search::similarity::best_index;
///
/// assert_eq!(best_index(&[0.2, 0.9, 0.9, 0.1]), Some(1));
/// assert_eq!(best_index(&[]), None);
/// ```
pub fn best_index(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}
