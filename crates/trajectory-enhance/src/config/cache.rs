//! Result cache configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EnhanceError, EnhanceResult};

fn default_max_entries() -> usize {
    10_000
}

fn default_max_bytes() -> usize {
    64 * 1024 * 1024
}

/// Configuration for [`crate::cache::ResultCache`].
///
/// Both bounds are enforced together: inserting past either limit evicts
/// least-recently-used entries until the cache is back under both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached enhanced embeddings.
    /// Default: 10000
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum total memory footprint of cached entries in bytes.
    /// Default: 64 MiB
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional entry time-to-live in seconds; expired entries are removed
    /// on access. None disables expiry.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_bytes: default_max_bytes(),
            ttl_seconds: None,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> EnhanceResult<()> {
        if self.max_entries == 0 {
            return Err(EnhanceError::ConfigError {
                message: "cache.max_entries cannot be 0".to_string(),
            });
        }
        if self.max_bytes == 0 {
            return Err(EnhanceError::ConfigError {
                message: "cache.max_bytes cannot be 0".to_string(),
            });
        }
        Ok(())
    }
}
