//! Weight store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, EnhanceResult};

fn default_root_dir() -> PathBuf {
    PathBuf::from("./weights")
}

fn default_seed() -> u64 {
    42
}

/// Configuration for [`crate::weights::WeightStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Directory weight artifacts are persisted under; one
    /// `<layer_id>.weights` file per layer, checkpoints under
    /// `checkpoints/<name>/`.
    /// Default: ./weights
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Base seed for deterministic initialization. The per-layer RNG stream
    /// is derived from this seed and the layer id, so the same seed, scheme
    /// and shape always produce a bit-identical matrix.
    /// Default: 42
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            seed: default_seed(),
        }
    }
}

impl WeightsConfig {
    pub fn validate(&self) -> EnhanceResult<()> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(EnhanceError::ConfigError {
                message: "weights.root_dir cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
