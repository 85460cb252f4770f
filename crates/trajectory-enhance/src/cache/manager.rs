//! LRU cache manager.

use std::sync::RwLock;
use std::time::Duration;

use linked_hash_map::LinkedHashMap;
use tracing::{debug, error};

use crate::config::CacheConfig;
use crate::error::{EnhanceError, EnhanceResult};

use super::{CacheEntry, CacheKey, CacheStats, CacheStatsSnapshot};

/// Bounded LRU cache mapping [`CacheKey`] to enhanced embeddings.
///
/// # Thread Safety
///
/// `RwLock` around the LRU map; `get` takes the write lock because LRU
/// reordering mutates the map order. Eviction and invalidation are safe to
/// call concurrently with lookups.
///
/// # Eviction
///
/// 1. TTL expiration (if configured): expired entries removed on access.
/// 2. Entry-count bound: oldest entries removed until under `max_entries`.
/// 3. Byte bound: oldest entries removed until under `max_bytes`.
pub struct ResultCache {
    entries: RwLock<LinkedHashMap<CacheKey, CacheEntry>>,
    config: CacheConfig,
    stats: CacheStats,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> EnhanceResult<Self> {
        config.validate()?;
        Ok(Self {
            entries: RwLock::new(LinkedHashMap::new()),
            config,
            stats: CacheStats::new(),
        })
    }

    /// Look up an enhanced embedding, refreshing its LRU position.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Vec<f32>> {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(_) => {
                self.stats.record_miss();
                return None;
            }
        };

        let entry = match entries.get_refresh(key) {
            Some(entry) => entry,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if let Some(ttl_secs) = self.config.ttl_seconds {
            if entry.is_expired(Duration::from_secs(ttl_secs)) {
                let size = entry.memory_size();
                entries.remove(key);
                self.stats.subtract_bytes(size);
                self.stats.record_miss();
                return None;
            }
        }

        entry.touch();
        entry.increment_access();
        self.stats.record_hit();
        Some(entry.enhanced.clone())
    }

    /// Insert an enhanced embedding, evicting LRU entries as needed.
    ///
    /// An entry whose size alone exceeds `max_bytes` is rejected.
    pub fn put(
        &self,
        key: CacheKey,
        enhanced: Vec<f32>,
        context_ids: Vec<String>,
    ) -> EnhanceResult<()> {
        let entry = CacheEntry::new(enhanced, context_ids);
        let entry_size = entry.memory_size();

        if entry_size > self.config.max_bytes {
            error!(
                entry_size,
                max_bytes = self.config.max_bytes,
                "cache entry exceeds byte budget"
            );
            return Err(EnhanceError::CacheError {
                message: format!(
                    "entry size {entry_size} bytes exceeds max_bytes {}",
                    self.config.max_bytes
                ),
            });
        }

        let mut entries = self.entries.write().map_err(|e| {
            error!("cache lock poisoned: {e}");
            EnhanceError::CacheError {
                message: format!("lock poisoned: {e}"),
            }
        })?;

        // Replacing an existing key never grows the cache: remove the old
        // entry up front so the count bound is not enforced against it and
        // its bytes are only subtracted once.
        if let Some(old) = entries.remove(&key) {
            self.stats.subtract_bytes(old.memory_size());
        } else {
            while entries.len() >= self.config.max_entries {
                if self.evict_oldest(&mut entries).is_none() {
                    break;
                }
            }
        }

        let mut projected = self
            .stats
            .snapshot()
            .bytes_used
            .saturating_add(entry_size);
        while projected > self.config.max_bytes && !entries.is_empty() {
            match self.evict_oldest(&mut entries) {
                Some(evicted) => projected = projected.saturating_sub(evicted),
                None => break,
            }
        }

        entries.insert(key, entry);
        self.stats.add_bytes(entry_size);
        Ok(())
    }

    fn evict_oldest(&self, entries: &mut LinkedHashMap<CacheKey, CacheEntry>) -> Option<usize> {
        let (_key, entry) = entries.pop_front()?;
        let size = entry.memory_size();
        self.stats.subtract_bytes(size);
        self.stats.record_eviction();
        Some(size)
    }

    /// Remove every entry that referenced `node_id` in its context ids.
    /// Returns the number of entries removed.
    pub fn invalidate_node(&self, node_id: &str) -> usize {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.references(node_id))
            .map(|(key, _)| *key)
            .collect();

        for key in &stale {
            if let Some(entry) = entries.remove(key) {
                self.stats.subtract_bytes(entry.memory_size());
            }
        }
        self.stats.record_invalidation(stale.len() as u64);
        debug!(node_id, removed = stale.len(), "invalidated cache entries for node");
        stale.len()
    }

    /// Drop every entry. Called after weight mutations so cached outputs of
    /// the old matrices cannot be served.
    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            let removed = entries.len() as u64;
            entries.clear();
            self.stats.reset_bytes();
            self.stats.record_invalidation(removed);
            debug!(removed, "invalidated entire result cache");
        }
    }

    /// Bulk-insert precomputed results (e.g. persisted from a prior run).
    /// Returns how many entries were accepted.
    pub fn warm_load(
        &self,
        items: Vec<(CacheKey, Vec<f32>, Vec<String>)>,
    ) -> EnhanceResult<usize> {
        let mut accepted = 0;
        for (key, enhanced, context_ids) in items {
            match self.put(key, enhanced, context_ids) {
                Ok(()) => accepted += 1,
                // Oversized individual entries are skipped, not fatal.
                Err(EnhanceError::CacheError { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(accepted)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.stats.snapshot().bytes_used
    }

    #[must_use]
    pub fn hit_rate(&self) -> f32 {
        let snap = self.stats.snapshot();
        let total = snap.hits + snap.misses;
        if total == 0 {
            0.0
        } else {
            snap.hits as f32 / total as f32
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_entries: usize, max_bytes: usize) -> ResultCache {
        ResultCache::new(CacheConfig {
            max_entries,
            max_bytes,
            ttl_seconds: None,
        })
        .unwrap()
    }

    fn key(n: u64) -> CacheKey {
        CacheKey {
            content_hash: n,
            generation: 0,
        }
    }

    #[test]
    fn hit_after_put() {
        let cache = cache(10, 1 << 20);
        cache.put(key(1), vec![1.0, 2.0], vec![]).unwrap();
        assert_eq!(cache.get(&key(1)), Some(vec![1.0, 2.0]));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.get(&key(2)), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn entry_count_eviction_is_lru() {
        let cache = cache(2, 1 << 20);
        cache.put(key(1), vec![1.0], vec![]).unwrap();
        cache.put(key(2), vec![2.0], vec![]).unwrap();
        // Touch key 1 so key 2 is the LRU victim.
        let _ = cache.get(&key(1));
        cache.put(key(3), vec![3.0], vec![]).unwrap();

        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(2)).is_none());
        assert!(cache.get(&key(3)).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn byte_budget_eviction() {
        // Each 10-float entry is 40 + 28 = 68 bytes; budget fits two.
        let cache = cache(100, 150);
        cache.put(key(1), vec![0.0; 10], vec![]).unwrap();
        cache.put(key(2), vec![0.0; 10], vec![]).unwrap();
        cache.put(key(3), vec![0.0; 10], vec![]).unwrap();
        assert!(cache.len() <= 2);
        assert!(cache.memory_usage() <= 150);
        assert!(cache.stats().evictions >= 1);
    }

    #[test]
    fn oversized_entry_rejected() {
        let cache = cache(10, 64);
        let err = cache.put(key(1), vec![0.0; 1000], vec![]).unwrap_err();
        assert!(matches!(err, EnhanceError::CacheError { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn reput_existing_key_at_capacity_replaces_in_place() {
        let cache = cache(2, 1 << 20);
        cache.put(key(1), vec![1.0], vec![]).unwrap();
        cache.put(key(2), vec![2.0], vec![]).unwrap();
        // Overwrite key 1 while full: nothing may be evicted.
        cache.put(key(1), vec![9.0, 9.0], vec![]).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(1)), Some(vec![9.0, 9.0]));
        assert_eq!(cache.get(&key(2)), Some(vec![2.0]));
        assert_eq!(cache.stats().evictions, 0);
        // Byte gauge reflects exactly the two live entries:
        // (8 + 28) for the 2-float entry, (4 + 28) for the 1-float one.
        assert_eq!(cache.memory_usage(), 36 + 32);
    }

    #[test]
    fn invalidate_node_removes_only_referencing_entries() {
        let cache = cache(10, 1 << 20);
        cache
            .put(key(1), vec![1.0], vec!["t1".to_string(), "t2".to_string()])
            .unwrap();
        cache.put(key(2), vec![2.0], vec!["t3".to_string()]).unwrap();
        cache.put(key(3), vec![3.0], vec![]).unwrap();

        let removed = cache.invalidate_node("t2");
        assert_eq!(removed, 1);
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_some());
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn invalidate_all_clears_and_counts() {
        let cache = cache(10, 1 << 20);
        cache.put(key(1), vec![1.0], vec![]).unwrap();
        cache.put(key(2), vec![2.0], vec![]).unwrap();
        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.memory_usage(), 0);
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn warm_load_then_get_is_hit() {
        let cache = cache(10, 1 << 20);
        let accepted = cache
            .warm_load(vec![
                (key(1), vec![1.0], vec![]),
                (key(2), vec![2.0], vec!["t1".to_string()]),
            ])
            .unwrap();
        assert_eq!(accepted, 2);
        assert_eq!(cache.get(&key(1)), Some(vec![1.0]));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn ttl_expiry_counts_as_miss() {
        let cache = ResultCache::new(CacheConfig {
            max_entries: 10,
            max_bytes: 1 << 20,
            ttl_seconds: Some(0),
        })
        .unwrap();
        cache.put(key(1), vec![1.0], vec![]).unwrap();
        assert_eq!(cache.get(&key(1)), None);
        assert_eq!(cache.stats().misses, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn hit_rate() {
        let cache = cache(10, 1 << 20);
        assert_eq!(cache.hit_rate(), 0.0);
        cache.put(key(1), vec![1.0], vec![]).unwrap();
        let _ = cache.get(&key(1));
        let _ = cache.get(&key(2));
        assert!((cache.hit_rate() - 0.5).abs() < 1e-6);
    }
}
