//! Contrastive training configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, EnhanceResult};

fn default_margin() -> f32 {
    0.5
}

fn default_positive_threshold() -> f32 {
    0.7
}

fn default_negative_threshold() -> f32 {
    0.5
}

fn default_max_gradient_norm() -> f32 {
    1.0
}

fn default_distance_epsilon() -> f32 {
    1e-8
}

/// Configuration for [`crate::training::ContrastiveTrainer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Margin for the hinge loss `max(0, d(Q,P) - d(Q,N) + margin)`.
    /// Must be > 0. Default: 0.5
    #[serde(default = "default_margin")]
    pub margin: f32,

    /// Minimum quality score for a trajectory to serve as a positive.
    /// Default: 0.7
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f32,

    /// Quality scores strictly below this serve as negatives; scores in
    /// `[negative_threshold, positive_threshold)` participate in neither
    /// role. Must be < positive_threshold. Default: 0.5
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f32,

    /// L2 norm cap applied to each averaged gradient vector.
    /// Default: 1.0
    #[serde(default = "default_max_gradient_norm")]
    pub max_gradient_norm: f32,

    /// Distances below this contribute zero to the gradient instead of
    /// dividing by a near-zero value.
    /// Default: 1e-8
    #[serde(default = "default_distance_epsilon")]
    pub distance_epsilon: f32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            positive_threshold: default_positive_threshold(),
            negative_threshold: default_negative_threshold(),
            max_gradient_norm: default_max_gradient_norm(),
            distance_epsilon: default_distance_epsilon(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> EnhanceResult<()> {
        if !(self.margin > 0.0) || !self.margin.is_finite() {
            return Err(EnhanceError::ConfigError {
                message: format!("training.margin must be a positive finite value, got {}", self.margin),
            });
        }
        if self.positive_threshold <= self.negative_threshold {
            return Err(EnhanceError::ConfigError {
                message: format!(
                    "training.positive_threshold ({}) must exceed negative_threshold ({})",
                    self.positive_threshold, self.negative_threshold
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.positive_threshold)
            || !(0.0..=1.0).contains(&self.negative_threshold)
        {
            return Err(EnhanceError::ConfigError {
                message: "training thresholds must lie in [0, 1]".to_string(),
            });
        }
        if !(self.max_gradient_norm > 0.0) {
            return Err(EnhanceError::ConfigError {
                message: "training.max_gradient_norm must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_thresholds_rejected() {
        let config = TrainingConfig {
            positive_threshold: 0.4,
            negative_threshold: 0.6,
            ..TrainingConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn zero_margin_rejected() {
        let config = TrainingConfig {
            margin: 0.0,
            ..TrainingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
