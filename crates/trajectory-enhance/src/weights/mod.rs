//! Per-layer weight matrix lifecycle.
//!
//! [`WeightStore`] owns one dense matrix per named layer: seeded
//! initialization ([`InitScheme`]), in-memory lookup as immutable `Arc`
//! snapshots, disk persistence with metadata and checksum, named
//! checkpoints, and shape/finiteness validation.
//!
//! Every mutation bumps an atomic generation counter. The generation is
//! baked into result-cache keys, so entries computed against older matrices
//! become unaddressable without any explicit invalidation call.

mod init;
mod persistence;
mod store;

pub use init::{initialize_matrix, InitScheme};
pub use store::WeightStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, EnhanceResult};
use crate::ops;

/// Metadata persisted alongside each weight matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightMetadata {
    /// Layer name, e.g. `layer_0` or `input_projection`.
    pub layer_id: String,
    /// Matrix input dimension (columns).
    pub in_dim: usize,
    /// Matrix output dimension (rows).
    pub out_dim: usize,
    /// Scheme the matrix was initialized with.
    pub scheme: InitScheme,
    /// Base seed the per-layer RNG stream was derived from.
    pub seed: u64,
    /// Timestamp of the last save (creation time until first save).
    pub saved_at: DateTime<Utc>,
}

/// A dense row-major `[out_dim, in_dim]` weight matrix plus its metadata.
///
/// Immutable once published by the store; updates swap in a whole new value
/// behind an `Arc`, so no forward pass ever observes a partial matrix.
#[derive(Debug, Clone)]
pub struct LayerWeights {
    pub metadata: WeightMetadata,
    data: Vec<f32>,
}

impl LayerWeights {
    /// Build and validate a layer matrix.
    pub fn new(metadata: WeightMetadata, data: Vec<f32>) -> EnhanceResult<Self> {
        validate_matrix(&data, metadata.in_dim, metadata.out_dim)?;
        Ok(Self { metadata, data })
    }

    #[must_use]
    pub fn in_dim(&self) -> usize {
        self.metadata.in_dim
    }

    #[must_use]
    pub fn out_dim(&self) -> usize {
        self.metadata.out_dim
    }

    /// Raw row-major matrix data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Project a vector through this matrix.
    pub fn project(&self, v: &[f32]) -> EnhanceResult<Vec<f32>> {
        ops::project(v, &self.data, self.in_dim(), self.out_dim())
    }

    /// Matrix memory footprint in bytes.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// Outcome of a weight load.
///
/// A missing or corrupt artifact is a normal condition, not an error:
/// whether to fall back to fresh initialization or abort startup is the
/// caller's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Artifact loaded and published to the in-memory store.
    Loaded,
    /// Artifact missing, corrupt, or shape-incompatible. In-memory weights
    /// are left untouched.
    NotAvailable { reason: String },
}

impl LoadOutcome {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// Validate a matrix buffer for shape and finiteness.
pub fn validate_matrix(data: &[f32], in_dim: usize, out_dim: usize) -> EnhanceResult<()> {
    let expected = in_dim * out_dim;
    if expected == 0 {
        return Err(EnhanceError::InvalidDimension {
            expected: 1,
            actual: 0,
        });
    }
    if data.len() != expected {
        return Err(EnhanceError::InvalidDimension {
            expected,
            actual: data.len(),
        });
    }
    ops::ensure_finite(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(in_dim: usize, out_dim: usize) -> WeightMetadata {
        WeightMetadata {
            layer_id: "layer_0".to_string(),
            in_dim,
            out_dim,
            scheme: InitScheme::HeNormal,
            seed: 42,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_wrong_shape() {
        let err = LayerWeights::new(metadata(2, 2), vec![0.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            EnhanceError::InvalidDimension { expected: 4, actual: 3 }
        ));
    }

    #[test]
    fn rejects_nan() {
        let err = LayerWeights::new(metadata(2, 2), vec![0.0, f32::NAN, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidValue { index: 1, .. }));
    }

    #[test]
    fn projects_through_matrix() {
        let w = LayerWeights::new(metadata(2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(w.project(&[5.0, 7.0]).unwrap(), vec![5.0, 7.0]);
        assert_eq!(w.memory_size(), 16);
    }
}
