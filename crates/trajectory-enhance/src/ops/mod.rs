//! Pure vector/matrix primitives used by the enhancement pipeline.
//!
//! No shared state: every function here is a plain computation over slices.
//! Dimension mismatches return [`crate::error::EnhanceError::InvalidDimension`];
//! nothing in this module allocates more than its output.

mod activation;
mod attention;
mod project;
mod vector;

pub use activation::{apply_activation, ActivationKind};
pub use attention::{attention_score, softmax, weighted_aggregate};
pub use project::project;
pub use vector::{add, ensure_finite, euclidean_distance, l2_normalize, resize};
