//! Advisory cache performance counters.
//!
//! An explicit metrics object owned by the state store, mirrored into the
//! `metrics` registry for operators. Reset alongside cache clears; never
//! consulted for correctness.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;

use crate::domain::types::DatasetKind;

#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    remote_calls: AtomicU64,
    local_filters: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub remote_calls: u64,
    pub local_filters: u64,
}

impl MetricsSnapshot {
    /// Hit ratio in percent, zero when nothing was counted.
    pub fn hit_ratio(&self) -> u64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0;
        }
        self.hits * 100 / total
    }
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self, dataset: DatasetKind) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("bayaz_cache_hit_total", "dataset" => dataset.as_str()).increment(1);
    }

    pub fn record_miss(&self, dataset: DatasetKind) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("bayaz_cache_miss_total", "dataset" => dataset.as_str()).increment(1);
    }

    pub fn record_remote_call(&self, dataset: DatasetKind) {
        self.remote_calls.fetch_add(1, Ordering::Relaxed);
        counter!("bayaz_remote_call_total", "dataset" => dataset.as_str()).increment(1);
    }

    pub fn record_local_filter(&self) {
        self.local_filters.fetch_add(1, Ordering::Relaxed);
        counter!("bayaz_local_filter_total").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            remote_calls: self.remote_calls.load(Ordering::Relaxed),
            local_filters: self.local_filters.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.remote_calls.store(0, Ordering::Relaxed);
        self.local_filters.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_reset() {
        let metrics = CacheMetrics::new();
        metrics.record_hit(DatasetKind::Poems);
        metrics.record_hit(DatasetKind::Featured);
        metrics.record_miss(DatasetKind::Poems);
        metrics.record_remote_call(DatasetKind::Poems);
        metrics.record_local_filter();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.remote_calls, 1);
        assert_eq!(snapshot.local_filters, 1);
        assert_eq!(snapshot.hit_ratio(), 66);

        metrics.reset();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.hit_ratio(), 0);
    }
}
