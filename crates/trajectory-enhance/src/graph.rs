//! Transient trajectory-graph types for neighborhood aggregation.
//!
//! A [`TrajectoryGraph`] lives for exactly one aggregation call; this core
//! never persists it. Node ids are caller-supplied strings (the storage
//! backend owns the real identity scheme).

use serde::{Deserialize, Serialize};

/// One related trajectory: id, embedding, and whatever opaque metadata the
/// caller wants to carry along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryNode {
    pub id: String,
    pub embedding: Vec<f32>,
    /// Opaque caller payload; not interpreted by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TrajectoryNode {
    #[must_use]
    pub fn new(id: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            embedding,
            metadata: None,
        }
    }
}

/// Weighted edge between two trajectory nodes. Weights are non-negative;
/// negative inputs are clamped to zero at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: f32,
}

impl GraphEdge {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: weight.max(0.0),
        }
    }
}

/// A small neighborhood of related trajectories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrajectoryGraph {
    pub nodes: Vec<TrajectoryNode>,
    pub edges: Vec<GraphEdge>,
}

impl TrajectoryGraph {
    #[must_use]
    pub fn new(nodes: Vec<TrajectoryNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Sum of edge weights touching `node_id`, counting both directions.
    ///
    /// For graphs that store an undirected edge once per direction this
    /// double-counts the edge; softmax renormalization cancels that out for
    /// symmetric graphs, while directed graphs get in+out degree weighting.
    #[must_use]
    pub fn importance(&self, node_id: &str) -> f32 {
        self.edges
            .iter()
            .filter(|e| e.source == node_id || e.target == node_id)
            .map(|e| e.weight)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_sums_both_directions() {
        let graph = TrajectoryGraph::new(
            vec![
                TrajectoryNode::new("a", vec![1.0]),
                TrajectoryNode::new("b", vec![1.0]),
            ],
            vec![
                GraphEdge::new("a", "b", 2.0),
                GraphEdge::new("b", "a", 3.0),
                GraphEdge::new("b", "c", 1.0),
            ],
        );
        assert!((graph.importance("a") - 5.0).abs() < 1e-6);
        assert!((graph.importance("b") - 6.0).abs() < 1e-6);
        assert_eq!(graph.importance("missing"), 0.0);
    }

    #[test]
    fn negative_edge_weight_clamped() {
        let edge = GraphEdge::new("a", "b", -1.5);
        assert_eq!(edge.weight, 0.0);
    }
}
