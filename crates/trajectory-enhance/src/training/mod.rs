//! Contrastive shaping of the embedding space.
//!
//! Quality-labeled trajectories are partitioned into positives and
//! negatives around a query; the cross product forms triplets scored with
//! a margin-ranking (hinge) loss over Euclidean distance. The backward
//! pass is the closed-form gradient of that one loss — there is no autodiff
//! here, and the optimizer consuming the gradients lives outside this
//! crate.

mod gradients;
mod loss;
mod mining;
mod pairs;

pub use gradients::{GradientBatch, TripletDiagnostic};
pub use pairs::{TrajectoryPair, TrajectorySample};

use crate::config::TrainingConfig;
use crate::error::EnhanceResult;

/// Builds triplets and computes loss/gradients from quality feedback.
pub struct ContrastiveTrainer {
    config: TrainingConfig,
}

impl ContrastiveTrainer {
    /// Create a trainer. Invalid thresholds or a non-positive margin are a
    /// fatal configuration error.
    pub fn new(config: TrainingConfig) -> EnhanceResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}
