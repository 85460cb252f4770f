//! Closed-form gradients of the margin-ranking loss.

use tracing::warn;

use super::{ContrastiveTrainer, TrajectoryPair};

/// Per-triplet diagnostics from a backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TripletDiagnostic {
    pub loss: f32,
    pub positive_distance: f32,
    pub negative_distance: f32,
    /// False for zero-loss triplets and for triplets excluded because they
    /// produced a non-finite gradient.
    pub active: bool,
}

/// Averaged, clipped gradients for one batch.
///
/// Gradients are with respect to the query, positive and negative
/// embeddings; applying them to weight matrices is the external
/// optimizer's job.
#[derive(Debug, Clone)]
pub struct GradientBatch {
    pub query_gradient: Vec<f32>,
    pub positive_gradient: Vec<f32>,
    pub negative_gradient: Vec<f32>,
    /// Mean loss over valid triplets (same value `compute` reports).
    pub loss: f32,
    /// Triplets that contributed a non-zero gradient.
    pub active_count: usize,
    /// Per-triplet breakdown, in input order (invalid triplets included,
    /// marked inactive with zero distances).
    pub triplets: Vec<TripletDiagnostic>,
}

impl GradientBatch {
    fn empty(dim: usize) -> Self {
        Self {
            query_gradient: vec![0.0; dim],
            positive_gradient: vec![0.0; dim],
            negative_gradient: vec![0.0; dim],
            loss: 0.0,
            active_count: 0,
            triplets: Vec::new(),
        }
    }
}

impl ContrastiveTrainer {
    /// Backward pass over a batch of triplets.
    ///
    /// For an active triplet (loss > 0):
    ///
    /// ```text
    /// dQ = (Q-P)/d(Q,P) - (Q-N)/d(Q,N)
    /// dP = -(Q-P)/d(Q,P)
    /// dN =  (Q-N)/d(Q,N)
    /// ```
    ///
    /// Each division is guarded: below `distance_epsilon` the term
    /// contributes zero. Per-triplet gradients are accumulated, averaged
    /// over the valid triplets, then each vector is clipped to
    /// `max_gradient_norm` L2. A triplet producing a non-finite gradient is
    /// excluded and marked inactive rather than poisoning the sum.
    #[must_use]
    pub fn backward(&self, pairs: &[TrajectoryPair]) -> GradientBatch {
        let dim = pairs.first().map_or(0, |p| p.query.len());
        let mut batch = GradientBatch::empty(dim);
        if pairs.is_empty() {
            return batch;
        }

        let epsilon = self.config().distance_epsilon;
        let mut loss_sum = 0.0f32;
        let mut valid_count = 0usize;

        for pair in pairs {
            let Some((loss, d_pos, d_neg)) = self.triplet_loss(pair) else {
                batch.triplets.push(TripletDiagnostic {
                    loss: 0.0,
                    positive_distance: 0.0,
                    negative_distance: 0.0,
                    active: false,
                });
                continue;
            };
            valid_count += 1;
            loss_sum += loss;

            if loss <= 0.0 {
                batch.triplets.push(TripletDiagnostic {
                    loss,
                    positive_distance: d_pos,
                    negative_distance: d_neg,
                    active: false,
                });
                continue;
            }

            // Unit-direction terms, each guarded against near-zero distance.
            let term = |other: &[f32], d: f32| -> Vec<f32> {
                if d < epsilon {
                    vec![0.0; dim]
                } else {
                    pair.query
                        .iter()
                        .zip(other)
                        .map(|(q, o)| (q - o) / d)
                        .collect()
                }
            };
            let toward_positive = term(&pair.positive, d_pos);
            let toward_negative = term(&pair.negative, d_neg);

            let d_query: Vec<f32> = toward_positive
                .iter()
                .zip(&toward_negative)
                .map(|(p, n)| p - n)
                .collect();

            let finite = d_query.iter().all(|x| x.is_finite())
                && toward_positive.iter().all(|x| x.is_finite())
                && toward_negative.iter().all(|x| x.is_finite());
            if !finite {
                warn!("excluding triplet with non-finite gradient");
                batch.triplets.push(TripletDiagnostic {
                    loss,
                    positive_distance: d_pos,
                    negative_distance: d_neg,
                    active: false,
                });
                continue;
            }

            for i in 0..dim {
                batch.query_gradient[i] += d_query[i];
                batch.positive_gradient[i] -= toward_positive[i];
                batch.negative_gradient[i] += toward_negative[i];
            }
            batch.active_count += 1;
            batch.triplets.push(TripletDiagnostic {
                loss,
                positive_distance: d_pos,
                negative_distance: d_neg,
                active: true,
            });
        }

        if valid_count > 0 {
            batch.loss = loss_sum / valid_count as f32;
            let inv = 1.0 / valid_count as f32;
            for g in [
                &mut batch.query_gradient,
                &mut batch.positive_gradient,
                &mut batch.negative_gradient,
            ] {
                for x in g.iter_mut() {
                    *x *= inv;
                }
                clip_to_norm(g, self.config().max_gradient_norm);
            }
        }
        batch
    }
}

/// Scale a vector down to at most `max_norm` L2.
fn clip_to_norm(v: &mut [f32], max_norm: f32) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > max_norm && norm > 0.0 {
        let scale = max_norm / norm;
        for x in v.iter_mut() {
            *x *= scale;
        }
    }
}
