//! Triplet mining: picking the samples worth training on.

use crate::ops;

use super::{ContrastiveTrainer, TrajectoryPair, TrajectorySample};

impl ContrastiveTrainer {
    /// Negatives ordered hardest-first: ascending distance to the query.
    /// A negative sitting close to the query violates the ranking most and
    /// yields the strongest gradient.
    #[must_use]
    pub fn hard_negatives<'a>(
        &self,
        samples: &'a [TrajectorySample],
        query: &[f32],
    ) -> Vec<&'a TrajectorySample> {
        let mut scored: Vec<(&TrajectorySample, f32)> = samples
            .iter()
            .filter(|s| s.quality < self.config().negative_threshold)
            .filter_map(|s| {
                ops::euclidean_distance(query, &s.embedding)
                    .ok()
                    .map(|d| (s, d))
            })
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(s, _)| s).collect()
    }

    /// Positives ordered hardest-first: descending distance to the query.
    #[must_use]
    pub fn hard_positives<'a>(
        &self,
        samples: &'a [TrajectorySample],
        query: &[f32],
    ) -> Vec<&'a TrajectorySample> {
        let mut scored: Vec<(&TrajectorySample, f32)> = samples
            .iter()
            .filter(|s| s.quality >= self.config().positive_threshold)
            .filter_map(|s| {
                ops::euclidean_distance(query, &s.embedding)
                    .ok()
                    .map(|d| (s, d))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(s, _)| s).collect()
    }

    /// Keep only semi-hard triplets: the negative is further than the
    /// positive but still inside the margin,
    /// `d(Q,P) < d(Q,N) < d(Q,P) + margin`. These produce bounded,
    /// well-conditioned gradients; easy triplets are already satisfied and
    /// the hardest ones tend to be label noise.
    #[must_use]
    pub fn semi_hard_pairs(&self, pairs: Vec<TrajectoryPair>) -> Vec<TrajectoryPair> {
        let margin = self.config().margin;
        pairs
            .into_iter()
            .filter(|pair| {
                let Some((_, d_pos, d_neg)) = self.triplet_loss(pair) else {
                    return false;
                };
                d_pos < d_neg && d_neg < d_pos + margin
            })
            .collect()
    }
}
