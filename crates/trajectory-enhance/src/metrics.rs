//! Latency histogram and line-oriented metrics export.
//!
//! The export format is plain `key value` lines, one metric per line,
//! suitable for a line-oriented metrics scraper:
//!
//! ```text
//! cache_hits 42
//! cache_misses 7
//! enhance_latency_ms_le_0.5 12
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::CacheStatsSnapshot;

/// Histogram bucket upper bounds in milliseconds. An implicit +inf bucket
/// catches everything slower.
pub const LATENCY_BUCKETS_MS: [f64; 8] = [0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0];

/// Fixed-bucket latency histogram with atomic counters.
#[derive(Debug, Default)]
pub struct LatencyHistogram {
    buckets: [AtomicU64; 8],
    overflow: AtomicU64,
    count: AtomicU64,
    /// Sum in microseconds so an integer atomic suffices.
    sum_us: AtomicU64,
}

impl LatencyHistogram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation in milliseconds.
    pub fn record(&self, ms: f64) {
        if !(ms >= 0.0) {
            return;
        }
        match LATENCY_BUCKETS_MS.iter().position(|&bound| ms <= bound) {
            Some(i) => self.buckets[i].fetch_add(1, Ordering::Relaxed),
            None => self.overflow.fetch_add(1, Ordering::Relaxed),
        };
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_us
            .fetch_add((ms * 1000.0).round() as u64, Ordering::Relaxed);
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Mean observed latency in milliseconds, 0.0 with no observations.
    #[must_use]
    pub fn mean_ms(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            return 0.0;
        }
        self.sum_us.load(Ordering::Relaxed) as f64 / 1000.0 / count as f64
    }

    /// Render cumulative bucket lines with the given metric prefix.
    fn render_into(&self, prefix: &str, out: &mut String) {
        let mut cumulative = 0u64;
        for (i, &bound) in LATENCY_BUCKETS_MS.iter().enumerate() {
            cumulative += self.buckets[i].load(Ordering::Relaxed);
            out.push_str(&format!("{prefix}_le_{bound} {cumulative}\n"));
        }
        cumulative += self.overflow.load(Ordering::Relaxed);
        out.push_str(&format!("{prefix}_le_inf {cumulative}\n"));
        out.push_str(&format!("{prefix}_count {}\n", self.count()));
        out.push_str(&format!("{prefix}_mean {:.3}\n", self.mean_ms()));
    }
}

/// Counters for the enhancement pipeline itself.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub calls: AtomicU64,
    pub fallbacks: AtomicU64,
    pub graph_aggregations: AtomicU64,
    pub latency: LatencyHistogram,
}

impl PipelineMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_call(&self, ms: f64) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.latency.record(ms);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_graph_aggregation(&self) {
        self.graph_aggregations.fetch_add(1, Ordering::Relaxed);
    }
}

/// Render all counters as `key value` lines.
#[must_use]
pub fn render_metrics(
    cache: &CacheStatsSnapshot,
    cache_entries: usize,
    pipeline: &PipelineMetrics,
    weight_generation: u64,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("cache_hits {}\n", cache.hits));
    out.push_str(&format!("cache_misses {}\n", cache.misses));
    out.push_str(&format!("cache_evictions {}\n", cache.evictions));
    out.push_str(&format!("cache_invalidations {}\n", cache.invalidations));
    out.push_str(&format!("cache_entries {cache_entries}\n"));
    out.push_str(&format!("cache_bytes {}\n", cache.bytes_used));
    out.push_str(&format!(
        "enhance_calls {}\n",
        pipeline.calls.load(Ordering::Relaxed)
    ));
    out.push_str(&format!(
        "enhance_fallbacks {}\n",
        pipeline.fallbacks.load(Ordering::Relaxed)
    ));
    out.push_str(&format!(
        "enhance_graph_aggregations {}\n",
        pipeline.graph_aggregations.load(Ordering::Relaxed)
    ));
    pipeline.latency.render_into("enhance_latency_ms", &mut out);
    out.push_str(&format!("weight_generation {weight_generation}\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_buckets_cumulative() {
        let hist = LatencyHistogram::new();
        hist.record(0.05); // le_0.1
        hist.record(0.3); // le_0.5
        hist.record(2.0); // le_5
        hist.record(9999.0); // overflow

        assert_eq!(hist.count(), 4);
        let mut out = String::new();
        hist.render_into("x", &mut out);
        assert!(out.contains("x_le_0.1 1\n"));
        assert!(out.contains("x_le_0.5 2\n"));
        assert!(out.contains("x_le_5 3\n"));
        assert!(out.contains("x_le_inf 4\n"));
        assert!(out.contains("x_count 4\n"));
    }

    #[test]
    fn negative_and_nan_observations_ignored() {
        let hist = LatencyHistogram::new();
        hist.record(-1.0);
        hist.record(f64::NAN);
        assert_eq!(hist.count(), 0);
        assert_eq!(hist.mean_ms(), 0.0);
    }

    #[test]
    fn render_is_line_oriented_key_value() {
        let cache = CacheStatsSnapshot {
            hits: 3,
            misses: 1,
            evictions: 0,
            invalidations: 2,
            bytes_used: 640,
        };
        let pipeline = PipelineMetrics::new();
        pipeline.record_call(1.5);

        let text = render_metrics(&cache, 5, &pipeline, 7);
        assert!(text.contains("cache_hits 3\n"));
        assert!(text.contains("cache_entries 5\n"));
        assert!(text.contains("cache_bytes 640\n"));
        assert!(text.contains("enhance_calls 1\n"));
        assert!(text.contains("weight_generation 7\n"));
        for line in text.lines() {
            assert_eq!(line.split(' ').count(), 2, "bad line: {line}");
        }
    }
}
