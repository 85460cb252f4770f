//! Cache entry with LRU metadata.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Process start instant; storing nanos-since-start keeps the LRU timestamp
/// in a single atomic u64.
static START_INSTANT: Lazy<Instant> = Lazy::new(Instant::now);

/// Fixed per-entry overhead: Instant + AtomicU64 + AtomicU32.
const ENTRY_METADATA_SIZE: usize = 16 + 8 + 4;

/// One cached enhanced embedding.
///
/// The embedding and context ids are immutable after creation; access
/// tracking uses relaxed atomics so lookups stay lock-light.
#[derive(Debug)]
pub struct CacheEntry {
    /// The enhanced embedding (immutable after creation).
    pub enhanced: Vec<f32>,
    /// Context ids the result was computed under; targeted invalidation
    /// matches against these.
    pub context_ids: Vec<String>,
    created_at: Instant,
    last_accessed: AtomicU64,
    access_count: AtomicU32,
}

impl CacheEntry {
    #[must_use]
    pub fn new(enhanced: Vec<f32>, context_ids: Vec<String>) -> Self {
        let now = START_INSTANT.elapsed().as_nanos() as u64;
        Self {
            enhanced,
            context_ids,
            created_at: Instant::now(),
            last_accessed: AtomicU64::new(now),
            access_count: AtomicU32::new(1),
        }
    }

    /// Refresh the LRU timestamp.
    pub fn touch(&self) {
        let now = START_INSTANT.elapsed().as_nanos() as u64;
        self.last_accessed.store(now, Ordering::Relaxed);
    }

    pub fn increment_access(&self) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn access_count(&self) -> u32 {
        self.access_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    /// True if this entry referenced the given node id.
    #[must_use]
    pub fn references(&self, node_id: &str) -> bool {
        self.context_ids.iter().any(|id| id == node_id)
    }

    /// Entry memory footprint for the byte budget.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.enhanced.len() * std::mem::size_of::<f32>()
            + self.context_ids.iter().map(|id| id.len()).sum::<usize>()
            + ENTRY_METADATA_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_size_counts_vector_and_ids() {
        let entry = CacheEntry::new(vec![0.0; 10], vec!["abcd".to_string()]);
        assert_eq!(entry.memory_size(), 40 + 4 + ENTRY_METADATA_SIZE);
    }

    #[test]
    fn references_matches_exact_id() {
        let entry = CacheEntry::new(vec![], vec!["t1".to_string(), "t2".to_string()]);
        assert!(entry.references("t1"));
        assert!(!entry.references("t"));
        assert!(!entry.references("t3"));
    }

    #[test]
    fn access_tracking() {
        let entry = CacheEntry::new(vec![0.0], vec![]);
        assert_eq!(entry.access_count(), 1);
        entry.increment_access();
        assert_eq!(entry.access_count(), 2);
    }

    #[test]
    fn not_expired_with_long_ttl() {
        let entry = CacheEntry::new(vec![0.0], vec![]);
        assert!(!entry.is_expired(Duration::from_secs(3600)));
        assert!(entry.is_expired(Duration::from_nanos(0)));
    }
}
