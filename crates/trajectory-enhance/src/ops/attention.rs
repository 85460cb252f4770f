//! Attention scoring, softmax and weighted aggregation.

use crate::error::{EnhanceError, EnhanceResult};

/// Scaled dot-product attention score: `dot(a, b) / sqrt(len)`.
///
/// Mismatched or empty inputs score 0.0 rather than erroring; scoring is a
/// ranking primitive and a useless candidate should simply rank nowhere.
#[must_use]
pub fn attention_score(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a.len() as f32).sqrt()
}

/// Numerically stable softmax.
///
/// Non-finite scores are excluded from the max and receive zero weight. If
/// every score is non-finite the whole row is zero-weighted: the result is
/// all zeros, never a division by zero.
#[must_use]
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);

    if !max.is_finite() {
        return vec![0.0; scores.len()];
    }

    let exps: Vec<f32> = scores
        .iter()
        .map(|&s| if s.is_finite() { (s - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return vec![0.0; scores.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}

/// Weighted sum of equal-length vectors.
///
/// `weights` is expected to be a softmax output (sums to ~1, or to 0 in the
/// all-non-finite degenerate case, which yields the zero vector).
pub fn weighted_aggregate(vectors: &[&[f32]], weights: &[f32]) -> EnhanceResult<Vec<f32>> {
    if vectors.is_empty() {
        return Err(EnhanceError::EmptyInput);
    }
    if vectors.len() != weights.len() {
        return Err(EnhanceError::InvalidDimension {
            expected: vectors.len(),
            actual: weights.len(),
        });
    }
    let dim = vectors[0].len();
    let mut out = vec![0.0f32; dim];
    for (v, &w) in vectors.iter().zip(weights) {
        if v.len() != dim {
            return Err(EnhanceError::InvalidDimension {
                expected: dim,
                actual: v.len(),
            });
        }
        for (acc, &x) in out.iter_mut().zip(v.iter()) {
            *acc += w * x;
        }
    }
    Ok(out)
}
