//! Forward pass through the fixed layer stack.

use std::sync::Arc;

use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::EnhanceResult;
use crate::ops;
use crate::weights::{LayerWeights, WeightStore};

use super::{layer_id, INPUT_PROJECTION_LAYER};

/// Activations recorded for one layer during a capturing forward pass.
///
/// Owned by the call that produced it; the backward pass consumes it.
/// `weights` is the exact matrix snapshot the pass used, so a concurrent
/// update cannot desynchronize gradient computation.
#[derive(Debug, Clone)]
pub struct LayerActivationCache {
    pub layer_id: String,
    /// Layer input (after the previous layer's normalization).
    pub input: Vec<f32>,
    /// Projection output before the activation function.
    pub pre_activation: Vec<f32>,
    /// Output immediately after the activation function.
    pub output: Vec<f32>,
    /// Matrix snapshot used for the projection.
    pub weights: Arc<LayerWeights>,
}

/// Run the full stack: prepare-input boundary, three layers, final
/// normalization. Returns `InvalidValue` if any stage goes non-finite; the
/// caller decides whether that degrades or propagates.
pub(super) fn run(
    config: &PipelineConfig,
    store: &WeightStore,
    embedding: &[f32],
    capture: bool,
) -> EnhanceResult<(Vec<f32>, Option<Vec<LayerActivationCache>>)> {
    ops::ensure_finite(embedding)?;

    let mut current = prepare_input(config, store, embedding)?;
    current = ops::l2_normalize(&current);

    let mut activations = capture.then(|| Vec::with_capacity(PipelineConfig::LAYER_COUNT));

    for i in 0..PipelineConfig::LAYER_COUNT {
        let id = layer_id(i);
        let weights = store.get(&id)?;
        let input = current;

        let pre_activation = weights.project(&input)?;
        let activated = ops::apply_activation(&pre_activation, config.activation);

        // Residual connection only when shapes line up, then L2 layer norm.
        let mut out = if weights.in_dim() == weights.out_dim() {
            ops::l2_normalize(&ops::add(&input, &activated)?)
        } else {
            activated.clone()
        };
        out = ops::l2_normalize(&out);
        ops::ensure_finite(&out)?;

        if let Some(trail) = activations.as_mut() {
            trail.push(LayerActivationCache {
                layer_id: id,
                input: input.clone(),
                pre_activation,
                output: activated,
                weights,
            });
        }
        current = out;
    }

    let enhanced = ops::l2_normalize(&current);
    ops::ensure_finite(&enhanced)?;
    Ok((enhanced, activations))
}

/// The single declared boundary where mismatched input is coerced to the
/// configured input dimension: exact lengths pass through, whole multiples
/// are projected via the input-projection layer, anything else is resized.
fn prepare_input(
    config: &PipelineConfig,
    store: &WeightStore,
    embedding: &[f32],
) -> EnhanceResult<Vec<f32>> {
    let input_dim = config.input_dim;
    if embedding.len() == input_dim {
        return Ok(embedding.to_vec());
    }
    if !embedding.is_empty() && embedding.len() % input_dim == 0 {
        let weights = store.get(INPUT_PROJECTION_LAYER)?;
        return weights.project(embedding);
    }
    debug!(
        len = embedding.len(),
        input_dim, "resizing mismatched input embedding"
    );
    Ok(ops::resize(embedding, input_dim))
}
