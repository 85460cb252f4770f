//! Seeded weight initialization schemes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::ops::ActivationKind;

/// Variance-scaled initialization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitScheme {
    /// Xavier/Glorot uniform: `U(-sqrt(6/(in+out)), sqrt(6/(in+out)))`.
    /// Suited to saturating activations (tanh, sigmoid).
    XavierUniform,
    /// He normal: `N(0, sqrt(2/in))`. Suited to the ReLU family.
    HeNormal,
}

impl InitScheme {
    /// Scheme matching an activation kind.
    #[must_use]
    pub fn for_activation(kind: ActivationKind) -> Self {
        if kind.is_rectified() {
            Self::HeNormal
        } else {
            Self::XavierUniform
        }
    }
}

/// Per-layer RNG stream: the base seed keyed by the layer id, so sibling
/// layers sharing one configured seed still get distinct matrices.
fn layer_seed(layer_id: &str, seed: u64) -> u64 {
    xxh64(layer_id.as_bytes(), seed)
}

/// Produce a row-major `[out_dim, in_dim]` matrix.
///
/// Deterministic: the same `(scheme, layer_id, seed, in_dim, out_dim)`
/// always yields a bit-identical buffer.
#[must_use]
pub fn initialize_matrix(
    scheme: InitScheme,
    layer_id: &str,
    seed: u64,
    in_dim: usize,
    out_dim: usize,
) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(layer_seed(layer_id, seed));
    let count = in_dim * out_dim;

    match scheme {
        InitScheme::XavierUniform => {
            let limit = (6.0 / (in_dim + out_dim) as f64).sqrt();
            (0..count)
                .map(|_| rng.gen_range(-limit..limit) as f32)
                .collect()
        }
        InitScheme::HeNormal => {
            let std = (2.0 / in_dim as f64).sqrt();
            // std > 0 for any non-zero in_dim, so the distribution is valid.
            let normal = Normal::new(0.0, std).unwrap_or_else(|_| Normal::new(0.0, 1.0).unwrap());
            (0..count).map(|_| normal.sample(&mut rng) as f32).collect()
        }
    }
}
