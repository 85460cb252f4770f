//! Bounded LRU cache of enhanced embeddings.
//!
//! Keys combine an xxHash64 content hash of the input embedding, the
//! ordered context-id list, and the current weight generation — identical
//! embeddings queried under different context (or after a weight change)
//! hash to different keys.
//!
//! Eviction is least-recently-used, triggered by either the entry-count or
//! byte bound. Targeted invalidation removes every entry that referenced a
//! given node id; bulk invalidation clears everything.

mod entry;
mod key;
mod manager;
mod stats;

pub use entry::CacheEntry;
pub use key::CacheKey;
pub use manager::ResultCache;
pub use stats::{CacheStats, CacheStatsSnapshot};
