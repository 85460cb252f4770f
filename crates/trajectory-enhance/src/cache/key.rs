//! Cache key derivation.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Key for one enhanced-embedding cache entry.
///
/// 16 bytes, `Copy`, directly usable as a map key. The `generation` half
/// makes entries computed against older weight matrices unaddressable
/// without any explicit invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// xxHash64 over the embedding bytes and the ordered context ids.
    pub content_hash: u64,
    /// Weight-store generation the entry was computed under.
    pub generation: u64,
}

impl CacheKey {
    /// Derive a key from embedding content, ordered context ids and the
    /// current weight generation.
    #[must_use]
    pub fn derive(embedding: &[f32], context_ids: &[String], generation: u64) -> Self {
        let mut bytes = Vec::with_capacity(embedding.len() * 4);
        for value in embedding {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let mut hash = xxh64(&bytes, 0);
        // Chain the ids so ["a", "b"] and ["ab"] hash differently.
        for id in context_ids {
            hash = xxh64(id.as_bytes(), hash);
            hash = hash.rotate_left(1) ^ id.len() as u64;
        }
        Self {
            content_hash: hash,
            generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn same_inputs_same_key() {
        let e = vec![0.25f32; 16];
        let a = CacheKey::derive(&e, &ids(&["t1", "t2"]), 3);
        let b = CacheKey::derive(&e, &ids(&["t1", "t2"]), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn context_changes_key() {
        let e = vec![0.25f32; 16];
        let none = CacheKey::derive(&e, &[], 0);
        let some = CacheKey::derive(&e, &ids(&["t1"]), 0);
        assert_ne!(none, some);
    }

    #[test]
    fn context_order_matters() {
        let e = vec![0.25f32; 16];
        let ab = CacheKey::derive(&e, &ids(&["a", "b"]), 0);
        let ba = CacheKey::derive(&e, &ids(&["b", "a"]), 0);
        assert_ne!(ab, ba);
    }

    #[test]
    fn id_boundaries_matter() {
        let e = vec![0.25f32; 16];
        let split = CacheKey::derive(&e, &ids(&["a", "b"]), 0);
        let joined = CacheKey::derive(&e, &ids(&["ab"]), 0);
        assert_ne!(split, joined);
    }

    #[test]
    fn generation_changes_key() {
        let e = vec![0.25f32; 16];
        let old = CacheKey::derive(&e, &[], 1);
        let new = CacheKey::derive(&e, &[], 2);
        assert_ne!(old, new);
    }

    #[test]
    fn embedding_content_changes_key() {
        let a = CacheKey::derive(&[1.0, 2.0], &[], 0);
        let b = CacheKey::derive(&[1.0, 2.5], &[], 0);
        assert_ne!(a, b);
    }
}
