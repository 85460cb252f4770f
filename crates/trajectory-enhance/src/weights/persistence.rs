//! Disk persistence and checkpoints for weight matrices.
//!
//! One artifact per layer: magic bytes + version + bincode payload +
//! xxhash64 checksum footer, written to a temp file then renamed. Data is
//! staged into local buffers so no lock is held across file I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use xxhash_rust::xxh64::xxh64;

use crate::error::{EnhanceError, EnhanceResult};

use super::store::WeightStore;
use super::{LayerWeights, LoadOutcome, WeightMetadata};

/// Magic bytes: "TJWT".
pub const WEIGHTS_MAGIC: [u8; 4] = [0x54, 0x4A, 0x57, 0x54];
/// Artifact format version.
pub const WEIGHTS_VERSION: u8 = 1;

/// Minimum artifact size: magic(4) + version(1) + checksum(8).
const MIN_FILE_LEN: usize = 13;

#[derive(Serialize, Deserialize)]
struct SavedLayer {
    metadata: WeightMetadata,
    data: Vec<f32>,
}

impl WeightStore {
    /// Artifact path for a layer.
    #[must_use]
    pub fn layer_path(&self, layer_id: &str) -> PathBuf {
        self.config.root_dir.join(format!("{layer_id}.weights"))
    }

    fn checkpoint_dir(&self, name: &str) -> PathBuf {
        self.config.root_dir.join("checkpoints").join(name)
    }

    /// Persist one layer to `<root>/<layer_id>.weights`.
    pub fn save_layer(&self, layer_id: &str) -> EnhanceResult<()> {
        let weights = self.get(layer_id)?;
        std::fs::create_dir_all(&self.config.root_dir)?;
        write_artifact(&self.layer_path(layer_id), &weights)
    }

    /// Persist every initialized layer.
    pub fn save_all(&self) -> EnhanceResult<()> {
        for layer_id in self.layer_ids() {
            self.save_layer(&layer_id)?;
        }
        Ok(())
    }

    /// Load one layer from disk and publish it.
    ///
    /// Missing, corrupt or shape-incompatible artifacts return
    /// [`LoadOutcome::NotAvailable`] and leave the in-memory matrix
    /// untouched — never zeros, never an `Err`.
    pub fn load_layer(&self, layer_id: &str) -> LoadOutcome {
        let path = self.layer_path(layer_id);
        let saved = match read_artifact(&path) {
            Ok(saved) => saved,
            Err(reason) => {
                warn!(layer_id, %reason, "weights not available on disk");
                return LoadOutcome::NotAvailable { reason };
            }
        };

        if saved.metadata.layer_id != layer_id {
            let reason = format!(
                "artifact is for layer {} (expected {layer_id})",
                saved.metadata.layer_id
            );
            warn!(layer_id, %reason, "weights not available on disk");
            return LoadOutcome::NotAvailable { reason };
        }

        // An already-initialized layer must keep its shape.
        if let Ok(current) = self.get(layer_id) {
            if current.in_dim() != saved.metadata.in_dim
                || current.out_dim() != saved.metadata.out_dim
            {
                let reason = format!(
                    "shape mismatch: artifact {}x{}, layer {}x{}",
                    saved.metadata.out_dim,
                    saved.metadata.in_dim,
                    current.out_dim(),
                    current.in_dim()
                );
                warn!(layer_id, %reason, "weights not available on disk");
                return LoadOutcome::NotAvailable { reason };
            }
        }

        let weights = match LayerWeights::new(saved.metadata, saved.data) {
            Ok(weights) => Arc::new(weights),
            Err(e) => {
                let reason = format!("artifact failed validation: {e}");
                warn!(layer_id, %reason, "weights not available on disk");
                return LoadOutcome::NotAvailable { reason };
            }
        };

        let mut layers = self.layers.write();
        layers.insert(layer_id.to_string(), weights);
        drop(layers);
        self.bump_generation();
        LoadOutcome::Loaded
    }

    /// Load every initialized layer from disk, returning the per-layer
    /// outcome so the caller can decide what to do about gaps.
    pub fn load_all(&self) -> Vec<(String, LoadOutcome)> {
        self.layer_ids()
            .into_iter()
            .map(|layer_id| {
                let outcome = self.load_layer(&layer_id);
                (layer_id, outcome)
            })
            .collect()
    }

    /// Snapshot every layer into a named checkpoint under
    /// `<root>/checkpoints/<name>/`.
    pub fn checkpoint(&self, name: &str) -> EnhanceResult<()> {
        let dir = self.checkpoint_dir(name);
        std::fs::create_dir_all(&dir)?;
        for layer_id in self.layer_ids() {
            let weights = self.get(&layer_id)?;
            write_artifact(&dir.join(format!("{layer_id}.weights")), &weights)?;
        }
        Ok(())
    }

    /// Restore every layer from a named checkpoint.
    ///
    /// All artifacts are staged and validated before anything is published,
    /// so a broken checkpoint never leaves the store half-restored.
    pub fn restore_checkpoint(&self, name: &str) -> EnhanceResult<()> {
        let dir = self.checkpoint_dir(name);
        let layer_ids = self.layer_ids();

        let mut staged = Vec::with_capacity(layer_ids.len());
        for layer_id in &layer_ids {
            let path = dir.join(format!("{layer_id}.weights"));
            let saved = read_artifact(&path).map_err(|reason| {
                error!(checkpoint = name, layer_id, %reason, "checkpoint restore failed");
                EnhanceError::SerializationError {
                    message: format!("checkpoint {name}, layer {layer_id}: {reason}"),
                }
            })?;
            let weights = LayerWeights::new(saved.metadata, saved.data)?;
            staged.push((layer_id.clone(), Arc::new(weights)));
        }

        let mut layers = self.layers.write();
        for (layer_id, weights) in staged {
            layers.insert(layer_id, weights);
        }
        drop(layers);
        self.bump_generation();
        Ok(())
    }
}

fn encode_artifact(weights: &LayerWeights) -> EnhanceResult<Vec<u8>> {
    let saved = SavedLayer {
        metadata: WeightMetadata {
            saved_at: chrono::Utc::now(),
            ..weights.metadata.clone()
        },
        data: weights.data().to_vec(),
    };
    let payload = bincode::serialize(&saved).map_err(|e| {
        error!("weight serialization failed: {e}");
        EnhanceError::SerializationError {
            message: format!("bincode serialization failed: {e}"),
        }
    })?;

    let mut buf = Vec::with_capacity(payload.len() + MIN_FILE_LEN);
    buf.extend_from_slice(&WEIGHTS_MAGIC);
    buf.push(WEIGHTS_VERSION);
    buf.extend_from_slice(&payload);
    let checksum = xxh64(&buf, 0);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

fn write_artifact(path: &Path, weights: &LayerWeights) -> EnhanceResult<()> {
    let buf = encode_artifact(weights)?;
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, &buf)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Decode an artifact file; every failure mode is a human-readable reason
/// string feeding `LoadOutcome::NotAvailable`.
fn read_artifact(path: &Path) -> Result<SavedLayer, String> {
    let data = std::fs::read(path).map_err(|e| format!("read {}: {e}", path.display()))?;

    if data.len() < MIN_FILE_LEN {
        return Err("artifact too small".to_string());
    }

    let checksum_offset = data.len() - 8;
    let stored = u64::from_le_bytes(
        data[checksum_offset..]
            .try_into()
            .map_err(|_| "invalid checksum bytes".to_string())?,
    );
    let computed = xxh64(&data[..checksum_offset], 0);
    if stored != computed {
        return Err(format!(
            "checksum mismatch (stored={stored:#x}, computed={computed:#x})"
        ));
    }

    if data[0..4] != WEIGHTS_MAGIC {
        return Err("invalid magic bytes".to_string());
    }
    let version = data[4];
    if version != WEIGHTS_VERSION {
        return Err(format!(
            "unsupported version {version} (expected {WEIGHTS_VERSION})"
        ));
    }

    bincode::deserialize(&data[5..checksum_offset])
        .map_err(|e| format!("bincode deserialization failed: {e}"))
}
