//! Cache Statistics Module
//!
//! Tracks cache counters with lock-free atomics so that recording an
//! outcome never contends with operations on other keys.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Live cache counters. Shared by reference across all shards.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    expired_evictions: AtomicU64,
    invalidations: AtomicU64,
    inserts: AtomicU64,
    oversized_rejections: AtomicU64,
}

impl CacheStats {
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// An expired entry was evicted lazily at read time or by the sweep.
    pub fn record_expired_eviction(&self) {
        self.expired_evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// A sweep evicted `count` expired entries at once.
    pub fn record_expired_evictions(&self, count: u64) {
        self.expired_evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_oversized_rejection(&self) {
        self.oversized_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time snapshot of the counters.
    pub fn snapshot(&self, total_entries: usize) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        StatsSnapshot {
            hits,
            misses,
            expired_evictions: self.expired_evictions.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            oversized_rejections: self.oversized_rejections.load(Ordering::Relaxed),
            total_entries,
            hit_rate,
        }
    }
}

// == Stats Snapshot ==
/// Serializable view of the counters at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub expired_evictions: u64,
    pub invalidations: u64,
    pub inserts: u64,
    pub oversized_rejections: u64,
    pub total_entries: usize,
    pub hit_rate: f64,
}
