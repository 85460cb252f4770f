//! Graph-attention neighborhood aggregation.

use tracing::debug;

use crate::error::EnhanceResult;
use crate::graph::TrajectoryGraph;
use crate::ops;

/// Aggregate a neighborhood into the center embedding.
///
/// Per neighbor, two scores combine additively:
/// - structural importance: `ln(w + 1)` where `w` sums all edge weights
///   touching the node in either direction (isolated nodes get no boost,
///   importance grows sub-linearly);
/// - content: scaled dot product against the center.
///
/// Softmax over the combined scores weights the neighbor embeddings; the
/// weighted sum is added to the center (residual) and L2-normalized.
/// Neighborhoods larger than `max_neighbors` are pruned to the
/// highest-importance nodes first (ties keep original order). Neighbors
/// whose embedding dimension differs from the center are skipped.
pub(super) fn aggregate_neighborhood(
    center: &[f32],
    graph: &TrajectoryGraph,
    max_neighbors: usize,
) -> EnhanceResult<Vec<f32>> {
    let mut candidates: Vec<(&[f32], f32)> = graph
        .nodes
        .iter()
        .filter(|node| node.embedding.len() == center.len())
        .map(|node| (node.embedding.as_slice(), graph.importance(&node.id)))
        .collect();

    let skipped = graph.nodes.len() - candidates.len();
    if skipped > 0 {
        debug!(skipped, "skipped graph nodes with mismatched embedding dimension");
    }
    if candidates.is_empty() {
        return Ok(ops::l2_normalize(center));
    }

    if candidates.len() > max_neighbors {
        // Stable sort keeps original order among equal importances.
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(max_neighbors);
    }

    let scores: Vec<f32> = candidates
        .iter()
        .map(|(embedding, importance)| {
            (importance + 1.0).ln() + ops::attention_score(center, embedding)
        })
        .collect();

    let attention = ops::softmax(&scores);
    let vectors: Vec<&[f32]> = candidates.iter().map(|(embedding, _)| *embedding).collect();
    let aggregated = ops::weighted_aggregate(&vectors, &attention)?;

    let combined = ops::add(center, &aggregated)?;
    let out = ops::l2_normalize(&combined);
    ops::ensure_finite(&out)?;
    Ok(out)
}
