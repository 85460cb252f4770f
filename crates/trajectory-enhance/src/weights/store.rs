//! In-memory weight store with snapshot lookup and generation tracking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::WeightsConfig;
use crate::error::{EnhanceError, EnhanceResult};

use super::{initialize_matrix, validate_matrix, InitScheme, LayerWeights, WeightMetadata};

/// Owns one matrix per named layer.
///
/// # Thread Safety
///
/// Lookups clone an `Arc<LayerWeights>` snapshot under a read lock; a
/// forward pass holds only its snapshot, so concurrent updates swap the map
/// entry without ever exposing a partially written matrix. Each mutation
/// bumps the generation counter before publishing.
pub struct WeightStore {
    pub(super) layers: RwLock<HashMap<String, Arc<LayerWeights>>>,
    pub(super) config: WeightsConfig,
    generation: AtomicU64,
}

impl WeightStore {
    #[must_use]
    pub fn new(config: WeightsConfig) -> Self {
        Self {
            layers: RwLock::new(HashMap::new()),
            config,
            generation: AtomicU64::new(0),
        }
    }

    /// Current weight generation. Bumped on every mutation; result-cache
    /// keys embed this so stale entries become unaddressable.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(super) fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Configured base seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Initialize (or re-initialize) a layer with a fresh seeded matrix.
    pub fn initialize_layer(
        &self,
        layer_id: &str,
        in_dim: usize,
        out_dim: usize,
        scheme: InitScheme,
    ) -> EnhanceResult<()> {
        if in_dim == 0 || out_dim == 0 {
            return Err(EnhanceError::ConfigError {
                message: format!("layer {layer_id}: dimensions cannot be 0"),
            });
        }
        let data = initialize_matrix(scheme, layer_id, self.config.seed, in_dim, out_dim);
        let metadata = WeightMetadata {
            layer_id: layer_id.to_string(),
            in_dim,
            out_dim,
            scheme,
            seed: self.config.seed,
            saved_at: Utc::now(),
        };
        let weights = Arc::new(LayerWeights::new(metadata, data)?);

        let mut layers = self.layers.write();
        layers.insert(layer_id.to_string(), weights);
        let generation = self.bump_generation();
        debug!(layer_id, in_dim, out_dim, generation, "initialized layer weights");
        Ok(())
    }

    /// Snapshot of a layer's current matrix.
    ///
    /// Requesting a layer that was never initialized is a configuration
    /// error, not a recoverable miss.
    pub fn get(&self, layer_id: &str) -> EnhanceResult<Arc<LayerWeights>> {
        self.layers
            .read()
            .get(layer_id)
            .cloned()
            .ok_or_else(|| EnhanceError::UnknownLayer {
                layer_id: layer_id.to_string(),
            })
    }

    /// True if the layer has a matrix in memory.
    #[must_use]
    pub fn contains(&self, layer_id: &str) -> bool {
        self.layers.read().contains_key(layer_id)
    }

    /// Ids of all initialized layers, sorted for stable iteration.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.layers.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Replace a layer's matrix with externally computed data (e.g. after an
    /// optimizer step). The shape must match the existing layer; the buffer
    /// is validated before the swap.
    pub fn update_layer(&self, layer_id: &str, data: Vec<f32>) -> EnhanceResult<()> {
        let current = self.get(layer_id)?;
        validate_matrix(&data, current.in_dim(), current.out_dim())?;

        let metadata = WeightMetadata {
            saved_at: Utc::now(),
            ..current.metadata.clone()
        };
        let weights = Arc::new(LayerWeights::new(metadata, data)?);

        let mut layers = self.layers.write();
        layers.insert(layer_id.to_string(), weights);
        let generation = self.bump_generation();
        debug!(layer_id, generation, "updated layer weights");
        Ok(())
    }

    /// Re-initialize every known layer from its recorded scheme and the
    /// configured seed.
    pub fn reinitialize_all(&self) -> EnhanceResult<()> {
        let snapshot: Vec<Arc<LayerWeights>> = self.layers.read().values().cloned().collect();
        // Stage all fresh matrices before taking the write lock.
        let mut fresh = Vec::with_capacity(snapshot.len());
        for layer in snapshot {
            let m = &layer.metadata;
            let data = initialize_matrix(m.scheme, &m.layer_id, self.config.seed, m.in_dim, m.out_dim);
            let metadata = WeightMetadata {
                saved_at: Utc::now(),
                ..m.clone()
            };
            fresh.push((m.layer_id.clone(), Arc::new(LayerWeights::new(metadata, data)?)));
        }

        let mut layers = self.layers.write();
        for (id, weights) in fresh {
            layers.insert(id, weights);
        }
        let generation = self.bump_generation();
        debug!(generation, "reinitialized all layers");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> WeightStore {
        let dir = tempfile::tempdir().unwrap();
        WeightStore::new(WeightsConfig {
            root_dir: dir.path().to_path_buf(),
            seed: 42,
        })
    }

    #[test]
    fn unknown_layer_is_fatal() {
        let store = store();
        let err = store.get("layer_0").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn initialize_then_get() {
        let store = store();
        store
            .initialize_layer("layer_0", 8, 4, InitScheme::HeNormal)
            .unwrap();
        let w = store.get("layer_0").unwrap();
        assert_eq!(w.in_dim(), 8);
        assert_eq!(w.out_dim(), 4);
        assert_eq!(w.data().len(), 32);
    }

    #[test]
    fn mutations_bump_generation() {
        let store = store();
        assert_eq!(store.generation(), 0);
        store
            .initialize_layer("layer_0", 4, 4, InitScheme::XavierUniform)
            .unwrap();
        assert_eq!(store.generation(), 1);
        store.update_layer("layer_0", vec![0.5; 16]).unwrap();
        assert_eq!(store.generation(), 2);
        store.reinitialize_all().unwrap();
        assert_eq!(store.generation(), 3);
    }

    #[test]
    fn update_rejects_wrong_shape() {
        let store = store();
        store
            .initialize_layer("layer_0", 4, 4, InitScheme::HeNormal)
            .unwrap();
        assert!(store.update_layer("layer_0", vec![0.0; 5]).is_err());
        assert!(store
            .update_layer("layer_0", vec![f32::INFINITY; 16])
            .is_err());
    }

    #[test]
    fn reinitialize_restores_seeded_matrix() {
        let store = store();
        store
            .initialize_layer("layer_0", 4, 4, InitScheme::HeNormal)
            .unwrap();
        let original = store.get("layer_0").unwrap().data().to_vec();
        store.update_layer("layer_0", vec![0.25; 16]).unwrap();
        store.reinitialize_all().unwrap();
        assert_eq!(store.get("layer_0").unwrap().data(), original.as_slice());
    }

    #[test]
    fn get_returns_snapshot() {
        let store = store();
        store
            .initialize_layer("layer_0", 4, 4, InitScheme::HeNormal)
            .unwrap();
        let snapshot = store.get("layer_0").unwrap();
        store.update_layer("layer_0", vec![0.125; 16]).unwrap();
        // The held snapshot is unaffected by the swap.
        assert_ne!(snapshot.data(), store.get("layer_0").unwrap().data());
    }
}
