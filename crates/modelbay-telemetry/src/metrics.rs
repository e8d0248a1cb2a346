//! Metrics collection and reporting

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for predictor serving
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    downloads: AtomicU64,
    download_cache_hits: AtomicU64,
    predictions: AtomicU64,
    profile_captures: AtomicU64,
    predict_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                downloads: AtomicU64::new(0),
                download_cache_hits: AtomicU64::new(0),
                predictions: AtomicU64::new(0),
                profile_captures: AtomicU64::new(0),
                predict_latency_us: AtomicU64::new(0),
            }),
        }
    }

    /// Record an artifact fetch that went to the network
    pub fn record_download(&self) {
        self.inner.downloads.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("modelbay_artifact_downloads_total").increment(1);
    }

    /// Record an artifact fetch satisfied by the checksum cache
    pub fn record_cache_hit(&self) {
        self.inner.download_cache_hits.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("modelbay_artifact_cache_hits_total").increment(1);
    }

    /// Record a completed prediction
    pub fn record_prediction(&self, latency_us: u64) {
        self.inner.predictions.fetch_add(1, Ordering::Relaxed);
        self.inner
            .predict_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        metrics::counter!("modelbay_predictions_total").increment(1);
        metrics::histogram!("modelbay_predict_latency_us").record(latency_us as f64);
    }

    /// Record a published engine profile
    pub fn record_profile_capture(&self) {
        self.inner.profile_captures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("modelbay_profile_captures_total").increment(1);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            downloads: self.inner.downloads.load(Ordering::Relaxed),
            download_cache_hits: self.inner.download_cache_hits.load(Ordering::Relaxed),
            predictions: self.inner.predictions.load(Ordering::Relaxed),
            profile_captures: self.inner.profile_captures.load(Ordering::Relaxed),
            predict_latency_us: self.inner.predict_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of collected metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub downloads: u64,
    pub download_cache_hits: u64,
    pub predictions: u64,
    pub profile_captures: u64,
    pub predict_latency_us: u64,
}
