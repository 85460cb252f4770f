//! Matrix-vector projection.

use crate::error::{EnhanceError, EnhanceResult};

/// Project `v` through a row-major `[out_dim, in_dim]` weight matrix.
///
/// If `v.len()` is a whole multiple `k > 1` of `in_dim`, the `k` chunks are
/// averaged element-wise first, so oversized inputs are folded down to the
/// matrix's input dimension instead of rejected. Any other length mismatch
/// is an error.
pub fn project(v: &[f32], weights: &[f32], in_dim: usize, out_dim: usize) -> EnhanceResult<Vec<f32>> {
    if in_dim == 0 || out_dim == 0 {
        return Err(EnhanceError::InvalidDimension {
            expected: 1,
            actual: 0,
        });
    }
    if weights.len() != in_dim * out_dim {
        return Err(EnhanceError::InvalidDimension {
            expected: in_dim * out_dim,
            actual: weights.len(),
        });
    }
    if v.is_empty() || v.len() % in_dim != 0 {
        return Err(EnhanceError::InvalidDimension {
            expected: in_dim,
            actual: v.len(),
        });
    }

    let folded;
    let input: &[f32] = if v.len() == in_dim {
        v
    } else {
        folded = fold_chunks(v, in_dim);
        &folded
    };

    let mut output = vec![0.0f32; out_dim];
    for (o, out) in output.iter_mut().enumerate() {
        let row = &weights[o * in_dim..(o + 1) * in_dim];
        let mut sum = 0.0f32;
        for (x, w) in input.iter().zip(row) {
            sum += x * w;
        }
        *out = sum;
    }
    Ok(output)
}

/// Average `k` consecutive chunks of length `in_dim` into one chunk.
fn fold_chunks(v: &[f32], in_dim: usize) -> Vec<f32> {
    let k = v.len() / in_dim;
    let inv = 1.0 / k as f32;
    let mut folded = vec![0.0f32; in_dim];
    for chunk in v.chunks_exact(in_dim) {
        for (acc, &x) in folded.iter_mut().zip(chunk) {
            *acc += x;
        }
    }
    for acc in &mut folded {
        *acc *= inv;
    }
    folded
}
