//! Per-node failure accounting.
//!
//! Counters live as atomics in a `DashMap` keyed by node for the ratio-gating
//! logic; when the `metrics` feature is enabled, every `record_served`/
//! `record_failed` call additionally emits through the `metrics` façade
//! under the `load_balancer_node_counter` / `load_balancer_node_failed_counter`
//! family names, for scraping.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Why [`FailureMetrics::ratio`] declined to return a ratio. Never
/// surfaced outside this module: callers only ever see `None`.
#[derive(Debug, PartialEq, Eq)]
enum RatioError {
    InsufficientSamples,
    InvalidRatio,
}

#[derive(Default)]
struct NodeCounters {
    served: AtomicU64,
    failed: AtomicU64,
}

/// Tracks, per node, how many requests were served and how many of those
/// were reported as failed, and derives a failure ratio once enough
/// samples have accumulated.
pub struct FailureMetrics {
    min_sample_size: u64,
    nodes: DashMap<String, NodeCounters>,
}

impl FailureMetrics {
    /// No ratio is ever reported for a node until it has been served at
    /// least `min_sample_size` times.
    pub fn new(min_sample_size: u64) -> Self {
        Self {
            min_sample_size,
            nodes: DashMap::new(),
        }
    }

    /// Records that `key` was handed out by a selection call. Every
    /// returned node counts towards its own sample size, whether or not
    /// the caller later reports a failure for it.
    pub fn record_served(&self, key: &str) {
        self.nodes
            .entry(key.to_string())
            .or_default()
            .served
            .fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("load_balancer_node_counter", "node" => key.to_string()).increment(1);
    }

    /// Records that `key` was reported failed via
    /// [`crate::balancer::LoadBalancer::node_failed`].
    pub fn record_failed(&self, key: &str) {
        self.nodes
            .entry(key.to_string())
            .or_default()
            .failed
            .fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("load_balancer_node_failed_counter", "node" => key.to_string())
            .increment(1);
    }

    /// The current failure ratio for `key`, clamped to `[0.0, 1.0]`, or
    /// `None` if there aren't enough samples yet (or none were ever
    /// recorded).
    pub fn ratio(&self, key: &str) -> Option<f64> {
        self.raw_ratio(key).ok()
    }

    fn raw_ratio(&self, key: &str) -> Result<f64, RatioError> {
        let entry = self.nodes.get(key).ok_or(RatioError::InsufficientSamples)?;
        let served = entry.served.load(Ordering::Relaxed);
        if served < self.min_sample_size {
            return Err(RatioError::InsufficientSamples);
        }
        let failed = entry.failed.load(Ordering::Relaxed);
        let ratio = failed as f64 / served as f64;
        if ratio.is_nan() {
            return Err(RatioError::InvalidRatio);
        }
        Ok(ratio.clamp(0.0, 1.0))
    }

    /// Clears the counters for a single node (used after it's exiled, so a
    /// future reappearance starts with a clean slate).
    pub fn reset(&self, key: &str) {
        self.nodes.remove(key);
    }

    /// Clears every node's counters (used on a full membership refresh).
    pub fn reset_all(&self) {
        self.nodes.clear();
    }
}
