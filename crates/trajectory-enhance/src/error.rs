//! Unified error type for the enhancement core.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type EnhanceResult<T> = Result<T, EnhanceError>;

/// Error type for all enhancement-pipeline failures.
///
/// # Error Categories
///
/// | Category | Variants | Recovery Strategy |
/// |----------|----------|-------------------|
/// | Configuration | ConfigError, UnknownLayer | Fatal — fix configuration |
/// | Validation | InvalidDimension, InvalidValue, EmptyInput | Recoverable — Enhancer degrades, Trainer drops the triplet |
/// | Infrastructure | CacheError, SerializationError, IoError | Retry or degrade |
///
/// Persistence "file not there / file corrupt" is deliberately NOT an error:
/// load operations return [`crate::weights::LoadOutcome::NotAvailable`] and
/// the caller decides between fresh initialization and failing startup.
#[derive(Debug, Error)]
pub enum EnhanceError {
    // === Configuration (fatal, never retried) ===
    /// Invalid configuration value (bad thresholds, zero bounds, margin <= 0).
    #[error("Config error: {message}")]
    ConfigError { message: String },

    /// Weights requested for a layer that was never initialized.
    #[error("Unknown layer: {layer_id} (not initialized)")]
    UnknownLayer { layer_id: String },

    // === Validation ===
    /// Vector or matrix dimension mismatch.
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// NaN or Infinity at a pipeline boundary.
    #[error("Invalid value at index {index}: {value}")]
    InvalidValue { index: usize, value: f32 },

    /// Empty input where at least one element is required.
    #[error("Empty input not allowed")]
    EmptyInput,

    // === Infrastructure ===
    /// Result cache operation failed (lock poisoned, oversized entry).
    #[error("Cache error: {message}")]
    CacheError { message: String },

    /// Weight artifact encode/decode failed.
    #[error("Serialization error: {message}")]
    SerializationError { message: String },

    /// File I/O failure while saving weights or checkpoints.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EnhanceError {
    /// True for programmer-error configuration violations that must not be
    /// retried or absorbed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigError { .. } | Self::UnknownLayer { .. }
        )
    }
}
