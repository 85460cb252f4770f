//! Configuration for the enhancement core.
//!
//! `EnhanceConfig` aggregates the per-subsystem configurations. All fields
//! carry serde defaults so a partial TOML file (or none at all) is valid:
//!
//! ```toml
//! [pipeline]
//! input_dim = 1536
//! layer_dims = [1536, 1536, 1536]
//! activation = "relu"
//!
//! [weights]
//! root_dir = "./weights"
//! seed = 42
//!
//! [cache]
//! max_entries = 10000
//! max_bytes = 67108864
//!
//! [training]
//! margin = 0.5
//! positive_threshold = 0.7
//! negative_threshold = 0.5
//! ```
//!
//! Invalid configuration returns [`EnhanceError::ConfigError`] immediately;
//! it is never silently corrected.

mod cache;
mod pipeline;
mod training;
mod weights;

pub use cache::CacheConfig;
pub use pipeline::PipelineConfig;
pub use training::TrainingConfig;
pub use weights::WeightsConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, EnhanceResult};

/// Top-level configuration for [`crate::enhancer::Enhancer`] and
/// [`crate::training::ContrastiveTrainer`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhanceConfig {
    /// Layered pipeline shape and activation.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Weight initialization and persistence.
    #[serde(default)]
    pub weights: WeightsConfig,

    /// Result cache bounds.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Contrastive training thresholds.
    #[serde(default)]
    pub training: TrainingConfig,
}

impl EnhanceConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> EnhanceResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw).map_err(|e| EnhanceError::ConfigError {
            message: format!("failed to parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all nested configurations, failing on the first violation.
    pub fn validate(&self) -> EnhanceResult<()> {
        self.pipeline.validate()?;
        self.weights.validate()?;
        self.cache.validate()?;
        self.training.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EnhanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.input_dim, crate::VECTOR_DIM);
        assert_eq!(config.pipeline.layer_dims.len(), 3);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: EnhanceConfig = toml::from_str(
            r#"
            [training]
            margin = 0.25
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.training.margin, 0.25);
        assert_eq!(config.training.positive_threshold, 0.7);
        assert_eq!(config.cache.max_entries, 10_000);
    }

    #[test]
    fn from_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not [ valid toml").unwrap();
        let err = EnhanceConfig::from_file(&path).unwrap_err();
        assert!(err.is_fatal());
    }
}
