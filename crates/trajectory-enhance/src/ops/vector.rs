//! Element-wise vector primitives.

use crate::error::{EnhanceError, EnhanceResult};

/// Element-wise sum of two equal-length vectors.
pub fn add(a: &[f32], b: &[f32]) -> EnhanceResult<Vec<f32>> {
    if a.len() != b.len() {
        return Err(EnhanceError::InvalidDimension {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter().zip(b).map(|(x, y)| x + y).collect())
}

/// L2-normalize a vector in place semantics (returns a new buffer).
///
/// The zero vector is returned unchanged; this never divides by zero.
#[must_use]
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    // f64 accumulation: the sum of squares of finite f32 values can
    // overflow f32 but never f64, so huge vectors still normalize.
    let norm_sq: f64 = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    if norm_sq == 0.0 || !norm_sq.is_finite() {
        return v.to_vec();
    }
    let inv = 1.0 / norm_sq.sqrt();
    v.iter().map(|&x| (f64::from(x) * inv) as f32).collect()
}

/// Zero-pad or truncate `v` to exactly `dim` elements.
///
/// This is the deterministic degradation shape: the Enhancer falls back to
/// `resize(original, output_dim)` when a stage produces NaN/Inf.
#[must_use]
pub fn resize(v: &[f32], dim: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; dim];
    let n = v.len().min(dim);
    out[..n].copy_from_slice(&v[..n]);
    out
}

/// Euclidean distance between two equal-length vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> EnhanceResult<f32> {
    if a.len() != b.len() {
        return Err(EnhanceError::InvalidDimension {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let sum_sq: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Ok(sum_sq.sqrt())
}

/// Verify every element is finite, reporting the first offender.
pub fn ensure_finite(v: &[f32]) -> EnhanceResult<()> {
    for (index, &value) in v.iter().enumerate() {
        if !value.is_finite() {
            return Err(EnhanceError::InvalidValue { index, value });
        }
    }
    Ok(())
}
