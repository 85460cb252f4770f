//! Learned enhancement of trajectory embeddings.
//!
//! A trajectory embedding (a fixed-width vector describing a past
//! problem-solving episode) is passed through a small stack of learned
//! projection layers and, optionally, a graph-attention aggregation step
//! that folds in neighboring trajectory embeddings. A companion contrastive
//! trainer shapes the embedding space from quality feedback: high-quality
//! trajectories are pulled toward the queries that produced them,
//! low-quality ones pushed away.
//!
//! # Components
//!
//! - [`ops`]: pure vector/matrix primitives (projection, normalization,
//!   activations, softmax, attention scoring, weighted aggregation)
//! - [`weights::WeightStore`]: per-layer weight matrices — seeded
//!   initialization, persistence, checkpoints, validation
//! - [`cache::ResultCache`]: bounded LRU cache of enhanced embeddings
//! - [`enhancer::Enhancer`]: the layered enhancement pipeline
//! - [`training::ContrastiveTrainer`]: triplet loss + closed-form gradients
//!
//! # Example
//!
//! ```rust,ignore
//! use trajectory_enhance::{config::EnhanceConfig, enhancer::{Enhancer, EnhanceOptions}};
//!
//! let enhancer = Enhancer::new(EnhanceConfig::default())?;
//! let out = enhancer.enhance(&embedding, &EnhanceOptions::default())?;
//! assert_eq!(out.enhanced.len(), 1536);
//! ```
//!
//! # Concurrency
//!
//! `enhance` and `backward` are CPU-bound and self-contained; weight
//! matrices are published as immutable `Arc` snapshots so a forward pass
//! never observes a partial update, and every weight mutation bumps a
//! generation counter that is part of the cache key.

pub mod cache;
pub mod config;
pub mod enhancer;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod ops;
pub mod training;
pub mod weights;

pub use cache::ResultCache;
pub use config::EnhanceConfig;
pub use enhancer::{EnhanceOptions, EnhanceOutput, Enhancer};
pub use error::{EnhanceError, EnhanceResult};
pub use graph::{GraphEdge, TrajectoryGraph, TrajectoryNode};
pub use training::{ContrastiveTrainer, GradientBatch, TrajectoryPair, TrajectorySample};
pub use weights::WeightStore;

/// Conventional trajectory embedding width.
pub const VECTOR_DIM: usize = 1536;
