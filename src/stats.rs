//! Statistics for the engine.
//!
//! Atomic counters that record what the engine saw from the store. A cache
//! outage in the default (suppressing) mode is invisible to callers, so
//! `transport_failures` is the place to notice one.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for engine operations.
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Reads that found a value.
    hits: AtomicU64,

    /// Reads that found nothing (including suppressed failures).
    misses: AtomicU64,

    /// Successful writes and adds.
    writes: AtomicU64,

    /// Deletes that removed a key.
    deletes: AtomicU64,

    /// Successful group version bumps.
    group_invalidations: AtomicU64,

    /// Transport failures seen, whether propagated or not.
    transport_failures: AtomicU64,

    /// Transport failures converted into a fallback value.
    suppressed_failures: AtomicU64,
}

impl EngineStats {
    /// Create a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_group_invalidation(&self) {
        self.group_invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suppressed(&self) {
        self.suppressed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    /// Calculate the hit rate as a percentage (0.0 to 100.0).
    /// Returns 0.0 if no reads have been performed.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            group_invalidations: self.group_invalidations.load(Ordering::Relaxed),
            transport_failures: self.transport_failures(),
            suppressed_failures: self.suppressed_failures.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
        }
    }
}

/// A point-in-time snapshot of engine statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub deletes: u64,
    pub group_invalidations: u64,
    pub transport_failures: u64,
    pub suppressed_failures: u64,
    pub hit_rate: f64,
}
