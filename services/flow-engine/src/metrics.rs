//! Engine observability
//!
//! Counters for ingestion, recomputation and store churn, plus a bounded
//! latency tracker for recomputations. `export()` yields a sorted map for
//! Prometheus-style exposition.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Core metrics for the flow engine.
pub struct EngineMetrics {
    // Ingestion
    pub events_processed: AtomicU64,
    pub events_dropped: AtomicU64,
    pub elements_skipped: AtomicU64,
    pub leaves_sanitized: AtomicU64,

    // Stores
    pub trades_evicted: AtomicU64,
    pub alerts_derived: AtomicU64,

    // Analytics
    pub recomputations: AtomicU64,
    pub analytics_pushes: AtomicU64,
    pub recompute_ns: Mutex<LatencyTracker>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            events_processed: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            elements_skipped: AtomicU64::new(0),
            leaves_sanitized: AtomicU64::new(0),
            trades_evicted: AtomicU64::new(0),
            alerts_derived: AtomicU64::new(0),
            recomputations: AtomicU64::new(0),
            analytics_pushes: AtomicU64::new(0),
            recompute_ns: Mutex::new(LatencyTracker::new(1000)),
        }
    }

    pub fn record_event_processed(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_elements_skipped(&self, count: u64) {
        self.elements_skipped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record non-finite values replaced with `null` on the way in.
    pub fn record_leaves_sanitized(&self, count: u64) {
        self.leaves_sanitized.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: u64) {
        self.trades_evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_alert_derived(&self) {
        self.alerts_derived.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one analytics recomputation and how long it took.
    pub fn record_recompute(&self, latency_ns: u64) {
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut tracker) = self.recompute_ns.lock() {
            tracker.record(latency_ns);
        }
    }

    /// Record a precomputed analytics payload adopted as the view.
    pub fn record_analytics_push(&self) {
        self.analytics_pushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics as a BTreeMap for Prometheus-style exposition.
    pub fn export(&self) -> BTreeMap<String, u64> {
        let mut m = BTreeMap::new();
        m.insert("events_processed".to_string(), self.events_processed.load(Ordering::Relaxed));
        m.insert("events_dropped".to_string(), self.events_dropped.load(Ordering::Relaxed));
        m.insert("elements_skipped".to_string(), self.elements_skipped.load(Ordering::Relaxed));
        m.insert("leaves_sanitized".to_string(), self.leaves_sanitized.load(Ordering::Relaxed));
        m.insert("trades_evicted".to_string(), self.trades_evicted.load(Ordering::Relaxed));
        m.insert("alerts_derived".to_string(), self.alerts_derived.load(Ordering::Relaxed));
        m.insert("recomputations".to_string(), self.recomputations.load(Ordering::Relaxed));
        m.insert("analytics_pushes".to_string(), self.analytics_pushes.load(Ordering::Relaxed));
        if let Ok(tracker) = self.recompute_ns.lock() {
            for (label, p) in [("p50", 50), ("p99", 99)] {
                if let Some(v) = tracker.percentile(p) {
                    m.insert(format!("recompute_ns_{label}"), v);
                }
            }
        }
        m
    }

    /// Zero every counter and drop latency samples.
    pub fn reset(&self) {
        for counter in [
            &self.events_processed,
            &self.events_dropped,
            &self.elements_skipped,
            &self.leaves_sanitized,
            &self.trades_evicted,
            &self.alerts_derived,
            &self.recomputations,
            &self.analytics_pushes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        if let Ok(mut tracker) = self.recompute_ns.lock() {
            tracker.clear();
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks latency samples for percentile calculation.
pub struct LatencyTracker {
    samples: VecDeque<u64>,
    max_samples: usize,
}

impl LatencyTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    /// Record a latency sample, dropping the oldest when full.
    pub fn record(&mut self, value: u64) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Get a percentile value (0-100).
    pub fn percentile(&self, p: usize) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (p as f64 / 100.0 * (sorted.len() - 1) as f64) as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }

    pub fn average(&self) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().sum();
        Some(sum / self.samples.len() as u64)
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
