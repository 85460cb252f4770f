//! Margin-ranking loss over Euclidean distance.

use crate::ops;

use super::{ContrastiveTrainer, TrajectoryPair};

impl ContrastiveTrainer {
    /// Hinge loss of one triplet: `max(0, d(Q,P) - d(Q,N) + margin)`.
    /// Returns None if the triplet's dimensions are inconsistent or a
    /// distance is non-finite.
    pub(super) fn triplet_loss(&self, pair: &TrajectoryPair) -> Option<(f32, f32, f32)> {
        let d_pos = ops::euclidean_distance(&pair.query, &pair.positive).ok()?;
        let d_neg = ops::euclidean_distance(&pair.query, &pair.negative).ok()?;
        if !d_pos.is_finite() || !d_neg.is_finite() {
            return None;
        }
        let loss = (d_pos - d_neg + self.config().margin).max(0.0);
        Some((loss, d_pos, d_neg))
    }

    /// Mean loss over all valid triplets in the batch; 0.0 for an empty
    /// batch. Never negative.
    #[must_use]
    pub fn compute(&self, pairs: &[TrajectoryPair]) -> f32 {
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for pair in pairs {
            if let Some((loss, _, _)) = self.triplet_loss(pair) {
                sum += loss;
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f32
        }
    }
}
