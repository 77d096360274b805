use std::sync::atomic::{AtomicU64, Ordering};

use super::store_kind::StoreKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    pub count: u64,
    pub size: u64,
}

/// Point-in-time usage of every store, computed by full enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub per_store: [StoreStatistics; StoreKind::COUNT],
    pub total_size: u64,
}

impl CacheStatistics {
    pub fn store(&self, kind: StoreKind) -> StoreStatistics {
        self.per_store[kind.index()]
    }

    pub fn total_count(&self) -> u64 {
        self.per_store.iter().map(|s| s.count).sum()
    }

    pub(crate) fn record(&mut self, kind: StoreKind, size: u64) {
        let slot = &mut self.per_store[kind.index()];
        slot.count += 1;
        slot.size = slot.size.saturating_add(size);
        self.total_size = self.total_size.saturating_add(size);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheRunStatsSnapshot {
    pub writes: u64,
    pub hits: u64,
    pub misses: u64,
    pub lazy_expirations: u64,
    pub cleanup_runs: u64,
    pub cleanup_removed_ttl: u64,
    pub cleanup_removed_size: u64,
    pub last_cleanup_duration_ms: u64,
}

/// Process-local counters; reset on restart.
#[derive(Debug, Default)]
pub struct CacheRunStats {
    writes: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    lazy_expirations: AtomicU64,
    cleanup_runs: AtomicU64,
    cleanup_removed_ttl: AtomicU64,
    cleanup_removed_size: AtomicU64,
    last_cleanup_duration_ms: AtomicU64,
}

impl CacheRunStats {
    pub fn on_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_lazy_expiry(&self) {
        self.lazy_expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_cleanup_finished(
        &self,
        removed_ttl: u64,
        removed_size: u64,
        duration_ms: u64,
    ) {
        self.cleanup_runs.fetch_add(1, Ordering::Relaxed);
        self.cleanup_removed_ttl
            .fetch_add(removed_ttl, Ordering::Relaxed);
        self.cleanup_removed_size
            .fetch_add(removed_size, Ordering::Relaxed);
        self.last_cleanup_duration_ms
            .store(duration_ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheRunStatsSnapshot {
        CacheRunStatsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            lazy_expirations: self.lazy_expirations.load(Ordering::Relaxed),
            cleanup_runs: self.cleanup_runs.load(Ordering::Relaxed),
            cleanup_removed_ttl: self
                .cleanup_removed_ttl
                .load(Ordering::Relaxed),
            cleanup_removed_size: self
                .cleanup_removed_size
                .load(Ordering::Relaxed),
            last_cleanup_duration_ms: self
                .last_cleanup_duration_ms
                .load(Ordering::Relaxed),
        }
    }
}
