//! Triplet construction from quality-labeled trajectories.

use tracing::debug;

use super::ContrastiveTrainer;

/// One recorded trajectory: its (enhanced) embedding and the quality score
/// its outcome earned, in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct TrajectorySample {
    pub embedding: Vec<f32>,
    pub quality: f32,
}

impl TrajectorySample {
    #[must_use]
    pub fn new(embedding: Vec<f32>, quality: f32) -> Self {
        Self { embedding, quality }
    }
}

/// A (query, positive, negative) triplet. Ephemeral: built per batch,
/// consumed by `compute`/`backward`.
#[derive(Debug, Clone)]
pub struct TrajectoryPair {
    pub query: Vec<f32>,
    pub positive: Vec<f32>,
    pub negative: Vec<f32>,
    pub positive_quality: f32,
    pub negative_quality: f32,
}

impl ContrastiveTrainer {
    /// Build the full positives × negatives cross product of triplets.
    ///
    /// Positives have `quality >= positive_threshold`, negatives
    /// `quality < negative_threshold`; the band in between participates in
    /// neither role. Samples whose embedding dimension differs from the
    /// query are skipped, not errors.
    #[must_use]
    pub fn create_pairs(
        &self,
        samples: &[TrajectorySample],
        query: &[f32],
    ) -> Vec<TrajectoryPair> {
        let usable: Vec<&TrajectorySample> = samples
            .iter()
            .filter(|s| s.embedding.len() == query.len())
            .collect();
        if usable.len() < samples.len() {
            debug!(
                skipped = samples.len() - usable.len(),
                "skipped samples with mismatched embedding dimension"
            );
        }

        let positives: Vec<&&TrajectorySample> = usable
            .iter()
            .filter(|s| s.quality >= self.config().positive_threshold)
            .collect();
        let negatives: Vec<&&TrajectorySample> = usable
            .iter()
            .filter(|s| s.quality < self.config().negative_threshold)
            .collect();

        let mut pairs = Vec::with_capacity(positives.len() * negatives.len());
        for positive in &positives {
            for negative in &negatives {
                pairs.push(TrajectoryPair {
                    query: query.to_vec(),
                    positive: positive.embedding.clone(),
                    negative: negative.embedding.clone(),
                    positive_quality: positive.quality,
                    negative_quality: negative.quality,
                });
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;

    fn trainer() -> ContrastiveTrainer {
        ContrastiveTrainer::new(TrainingConfig::default()).unwrap()
    }

    fn samples(qualities: &[f32]) -> Vec<TrajectorySample> {
        qualities
            .iter()
            .enumerate()
            .map(|(i, &q)| TrajectorySample::new(vec![i as f32; 4], q))
            .collect()
    }

    #[test]
    fn partitioning_at_default_thresholds() {
        // 0.9 and 0.8 are positives, 0.4 and 0.2 negatives; 0.6 is in the
        // dead band and appears in no triplet.
        let trainer = trainer();
        let samples = samples(&[0.9, 0.8, 0.6, 0.4, 0.2]);
        let pairs = trainer.create_pairs(&samples, &[0.0; 4]);
        assert_eq!(pairs.len(), 4);
        for pair in &pairs {
            assert!(pair.positive_quality >= 0.7);
            assert!(pair.negative_quality < 0.5);
            // The 0.6 sample's embedding is [2.0; 4].
            assert_ne!(pair.positive[0], 2.0);
            assert_ne!(pair.negative[0], 2.0);
        }
    }

    #[test]
    fn boundary_qualities() {
        // Exactly 0.7 is a positive; exactly 0.5 is neither.
        let trainer = trainer();
        let samples = samples(&[0.7, 0.5, 0.2]);
        let pairs = trainer.create_pairs(&samples, &[0.0; 4]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].positive_quality, 0.7);
        assert_eq!(pairs[0].negative_quality, 0.2);
    }

    #[test]
    fn mismatched_dimension_skipped() {
        let trainer = trainer();
        let mut samples = samples(&[0.9, 0.2]);
        samples.push(TrajectorySample::new(vec![1.0; 9], 0.95));
        let pairs = trainer.create_pairs(&samples, &[0.0; 4]);
        // The 9-dim positive is skipped: 1 positive x 1 negative.
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn no_positives_means_no_pairs() {
        let trainer = trainer();
        let pairs = trainer.create_pairs(&samples(&[0.3, 0.1]), &[0.0; 4]);
        assert!(pairs.is_empty());
    }
}
