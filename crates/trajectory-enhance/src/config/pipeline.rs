//! Pipeline shape configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, EnhanceResult};
use crate::ops::ActivationKind;

fn default_input_dim() -> usize {
    crate::VECTOR_DIM
}

fn default_layer_dims() -> Vec<usize> {
    vec![crate::VECTOR_DIM; 3]
}

fn default_activation() -> ActivationKind {
    ActivationKind::Relu
}

fn default_max_neighbors() -> usize {
    32
}

/// Shape of the layered enhancement pipeline.
///
/// The pipeline is three fixed layers; `layer_dims[i]` is the output
/// dimension of layer `i` (its input dimension is the previous layer's
/// output, or `input_dim` for layer 0). The final entry is the output
/// dimension of the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Dimension embeddings are projected to before layer 0.
    /// Default: 1536
    #[serde(default = "default_input_dim")]
    pub input_dim: usize,

    /// Output dimension of each of the three layers.
    /// Default: [1536, 1536, 1536]
    #[serde(default = "default_layer_dims")]
    pub layer_dims: Vec<usize>,

    /// Element-wise activation applied after each projection.
    /// Also selects the weight initialization scheme (He for ReLU-family,
    /// Xavier for saturating activations).
    /// Default: relu
    #[serde(default = "default_activation")]
    pub activation: ActivationKind,

    /// Neighbor cap for graph-attention aggregation; graphs larger than
    /// this are pruned to the highest-importance nodes.
    /// Default: 32
    #[serde(default = "default_max_neighbors")]
    pub max_neighbors: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dim: default_input_dim(),
            layer_dims: default_layer_dims(),
            activation: default_activation(),
            max_neighbors: default_max_neighbors(),
        }
    }
}

impl PipelineConfig {
    /// Number of fixed enhancement layers.
    pub const LAYER_COUNT: usize = 3;

    /// Output dimension of the whole pipeline.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.layer_dims.last().copied().unwrap_or(self.input_dim)
    }

    /// Input dimension of layer `index`.
    #[must_use]
    pub fn layer_input_dim(&self, index: usize) -> usize {
        if index == 0 {
            self.input_dim
        } else {
            self.layer_dims[index - 1]
        }
    }

    pub fn validate(&self) -> EnhanceResult<()> {
        if self.input_dim == 0 {
            return Err(EnhanceError::ConfigError {
                message: "pipeline.input_dim cannot be 0".to_string(),
            });
        }
        if self.layer_dims.len() != Self::LAYER_COUNT {
            return Err(EnhanceError::ConfigError {
                message: format!(
                    "pipeline.layer_dims must have exactly {} entries, got {}",
                    Self::LAYER_COUNT,
                    self.layer_dims.len()
                ),
            });
        }
        if self.layer_dims.iter().any(|&d| d == 0) {
            return Err(EnhanceError::ConfigError {
                message: "pipeline.layer_dims entries cannot be 0".to_string(),
            });
        }
        if self.max_neighbors == 0 {
            return Err(EnhanceError::ConfigError {
                message: "pipeline.max_neighbors cannot be 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_dim_chaining() {
        let config = PipelineConfig {
            input_dim: 512,
            layer_dims: vec![512, 256, 256],
            ..PipelineConfig::default()
        };
        assert_eq!(config.layer_input_dim(0), 512);
        assert_eq!(config.layer_input_dim(1), 512);
        assert_eq!(config.layer_input_dim(2), 256);
        assert_eq!(config.output_dim(), 256);
    }

    #[test]
    fn rejects_wrong_layer_count() {
        let config = PipelineConfig {
            layer_dims: vec![1536, 1536],
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
