//! The layered enhancement pipeline.
//!
//! [`Enhancer`] orchestrates the weight store, the result cache and the
//! numeric primitives: an embedding is cache-checked, projected to the
//! configured input dimension, run through three fixed layers
//! (projection, activation, residual where dimensions match, L2 layer
//! normalization), normalized and cached.
//!
//! Enhancement never fails the caller on bad numbers: if any stage
//! produces NaN/Inf the result degrades to a zero-padded/truncated copy of
//! the original input at the configured output dimension.

mod attention;
mod pipeline;

pub use pipeline::LayerActivationCache;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::cache::{CacheKey, ResultCache};
use crate::config::{EnhanceConfig, PipelineConfig};
use crate::error::{EnhanceError, EnhanceResult};
use crate::graph::TrajectoryGraph;
use crate::metrics::{render_metrics, PipelineMetrics};
use crate::ops;
use crate::weights::{InitScheme, WeightStore};

/// Layer id of the prepare-input projection boundary.
pub const INPUT_PROJECTION_LAYER: &str = "input_projection";

/// Id of enhancement layer `index`.
#[must_use]
pub fn layer_id(index: usize) -> String {
    format!("layer_{index}")
}

/// Per-call options for [`Enhancer::enhance`].
#[derive(Debug, Clone, Default)]
pub struct EnhanceOptions {
    /// Neighborhood to aggregate before the layer stack. The graph path is
    /// call-specific context and never consults or populates the cache.
    pub graph: Option<TrajectoryGraph>,
    /// Ordered context ids mixed into the cache key (and recorded for
    /// targeted invalidation).
    pub context_ids: Vec<String>,
    /// Record per-layer activations for a later backward pass. Forces a
    /// cache bypass: cached results carry no activation trail.
    pub capture_activations: bool,
}

/// Result of one enhancement call.
#[derive(Debug, Clone)]
pub struct EnhanceOutput {
    /// Enhanced embedding, exactly `output_dim` long, free of NaN/Inf.
    pub enhanced: Vec<f32>,
    /// True if served from the result cache.
    pub cached: bool,
    /// Wall-clock time of this call in milliseconds.
    pub timing_ms: f64,
    /// Per-layer activation trail, present only when requested.
    pub activations: Option<Vec<LayerActivationCache>>,
}

/// Outcome of running the layer stack: the enhanced vector, an optional
/// activation trail, and whether the numeric fallback was taken.
struct StackResult {
    enhanced: Vec<f32>,
    activations: Option<Vec<LayerActivationCache>>,
    degraded: bool,
}

/// Orchestrates NumericOps + WeightStore + ResultCache.
pub struct Enhancer {
    config: EnhanceConfig,
    weights: Arc<WeightStore>,
    cache: Arc<ResultCache>,
    metrics: PipelineMetrics,
}

impl Enhancer {
    /// Build an enhancer with freshly initialized weights.
    pub fn new(config: EnhanceConfig) -> EnhanceResult<Self> {
        config.validate()?;
        let weights = Arc::new(WeightStore::new(config.weights.clone()));
        let cache = Arc::new(ResultCache::new(config.cache.clone())?);

        let scheme = InitScheme::for_activation(config.pipeline.activation);
        let input_dim = config.pipeline.input_dim;
        weights.initialize_layer(INPUT_PROJECTION_LAYER, input_dim, input_dim, scheme)?;
        for i in 0..PipelineConfig::LAYER_COUNT {
            weights.initialize_layer(
                &layer_id(i),
                config.pipeline.layer_input_dim(i),
                config.pipeline.layer_dims[i],
                scheme,
            )?;
        }

        Ok(Self {
            config,
            weights,
            cache,
            metrics: PipelineMetrics::new(),
        })
    }

    /// Build an enhancer, then overlay any weights persisted under the
    /// configured root. Layers whose artifacts are missing or corrupt keep
    /// their fresh initialization (reported with a warning).
    pub fn with_persisted_weights(config: EnhanceConfig) -> EnhanceResult<Self> {
        let enhancer = Self::new(config)?;
        for (layer, outcome) in enhancer.weights.load_all() {
            if !outcome.is_loaded() {
                warn!(layer, "persisted weights unavailable, keeping fresh initialization");
            }
        }
        Ok(enhancer)
    }

    /// Enhance one embedding.
    ///
    /// Dimension mismatches on the primary embedding are projected (or
    /// resized) internally, never rejected. Numeric corruption degrades to
    /// the resized original. Only configuration mistakes — an uninitialized
    /// layer — surface as errors.
    pub fn enhance(&self, embedding: &[f32], options: &EnhanceOptions) -> EnhanceResult<EnhanceOutput> {
        let start = Instant::now();
        let result = self.enhance_inner(embedding, options, start);
        if let Ok(output) = &result {
            self.metrics.record_call(output.timing_ms);
        }
        result
    }

    fn enhance_inner(
        &self,
        embedding: &[f32],
        options: &EnhanceOptions,
        start: Instant,
    ) -> EnhanceResult<EnhanceOutput> {
        // Graph path: aggregate first, never touch the cache.
        if let Some(graph) = &options.graph {
            self.metrics.record_graph_aggregation();
            let result = match attention::aggregate_neighborhood(
                embedding,
                graph,
                self.config.pipeline.max_neighbors,
            ) {
                Ok(aggregated) => {
                    self.run_stack(embedding, &aggregated, options.capture_activations)?
                }
                Err(EnhanceError::InvalidValue { index, value }) => {
                    warn!(index, value, "graph aggregation produced non-finite values, degrading");
                    self.degraded_result(embedding)
                }
                Err(e) => return Err(e),
            };
            return Ok(EnhanceOutput {
                enhanced: result.enhanced,
                cached: false,
                timing_ms: elapsed_ms(start),
                activations: result.activations,
            });
        }

        let key = CacheKey::derive(embedding, &options.context_ids, self.weights.generation());
        if !options.capture_activations {
            if let Some(enhanced) = self.cache.get(&key) {
                return Ok(EnhanceOutput {
                    enhanced,
                    cached: true,
                    timing_ms: elapsed_ms(start),
                    activations: None,
                });
            }
        }

        let result = self.run_stack(embedding, embedding, options.capture_activations)?;

        // Cache real results only: activation-capturing calls bypass the
        // cache, and fallback vectors carry nothing worth reusing.
        if !options.capture_activations && !result.degraded {
            if let Err(e) = self
                .cache
                .put(key, result.enhanced.clone(), options.context_ids.clone())
            {
                debug!("cache store skipped: {e}");
            }
        }

        Ok(EnhanceOutput {
            enhanced: result.enhanced,
            cached: false,
            timing_ms: elapsed_ms(start),
            activations: result.activations,
        })
    }

    /// Run the layer stack; numeric corruption degrades to the resized
    /// original instead of erroring.
    fn run_stack(&self, original: &[f32], working: &[f32], capture: bool) -> EnhanceResult<StackResult> {
        match pipeline::run(&self.config.pipeline, &self.weights, working, capture) {
            Ok((enhanced, activations)) => Ok(StackResult {
                enhanced,
                activations,
                degraded: false,
            }),
            Err(EnhanceError::InvalidValue { index, value }) => {
                warn!(index, value, "pipeline produced non-finite values, returning resized original");
                Ok(self.degraded_result(original))
            }
            Err(e) => Err(e),
        }
    }

    fn degraded_result(&self, original: &[f32]) -> StackResult {
        self.metrics.record_fallback();
        let mut enhanced = ops::resize(original, self.config.pipeline.output_dim());
        // The original itself may be the source of the corruption; the
        // fallback still has to honor the no-NaN/Inf output contract.
        for value in enhanced.iter_mut() {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        StackResult {
            enhanced,
            activations: None,
            degraded: true,
        }
    }

    /// Re-initialize all weights from the configured seed and invalidate
    /// the cache as the same step.
    pub fn reinitialize(&self) -> EnhanceResult<()> {
        self.weights.reinitialize_all()?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Restore weights from a named checkpoint and invalidate the cache.
    pub fn restore_checkpoint(&self, name: &str) -> EnhanceResult<()> {
        self.weights.restore_checkpoint(name)?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// The underlying weight store (for persistence and optimizer updates).
    #[must_use]
    pub fn weights(&self) -> &Arc<WeightStore> {
        &self.weights
    }

    /// The result cache (for targeted invalidation and warm loading).
    #[must_use]
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    /// Line-oriented metrics export (cache counters, latency histogram,
    /// weight generation).
    #[must_use]
    pub fn export_metrics(&self) -> String {
        render_metrics(
            &self.cache.stats(),
            self.cache.len(),
            &self.metrics,
            self.weights.generation(),
        )
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
