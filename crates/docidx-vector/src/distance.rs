//! Distance functions for the dense index.
//!
//! Every function returns a *distance* (lower is closer) so callers sort
//! ascending and take the first `k`.

use docidx_core::DistanceMetric;

#[inline]
pub fn compute_distance(a: &[f32], b: &[f32], metric: DistanceMetric) -> f32 {
    match metric {
        DistanceMetric::Cosine => cosine_distance(a, b),
        DistanceMetric::Euclidean => euclidean_distance(a, b),
    }
}

/// Cosine distance: `1.0 - cosine_similarity(a, b)`, in `[0, 2]`.
///
/// Zero-magnitude vectors: both zero → 0.0, exactly one zero → 1.0.
/// Accumulates in f64 so any finite f32 input stays finite.
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");

    let (dot, norm_a, norm_b) = cosine_components(a, b);
    match (norm_a == 0.0, norm_b == 0.0) {
        (true, true) => return 0.0,
        (true, false) | (false, true) => return 1.0,
        (false, false) => {}
    }

    // Squared f32 norms are at most dim * 1.2e77, so their product stays finite in f64.
    let similarity = dot / (norm_a * norm_b).sqrt();
    if similarity.is_nan() { return 2.0; }
    // Clamp to [-1, 1] to handle floating-point drift.
    (1.0 - similarity.clamp(-1.0, 1.0)) as f32
}

/// Euclidean (L2) distance, accumulated in f64.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}

/// (dot, ||a||^2, ||b||^2) in a single pass.
#[inline]
fn cosine_components(a: &[f32], b: &[f32]) -> (f64, f64, f64) {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    (dot, norm_a, norm_b)
}
