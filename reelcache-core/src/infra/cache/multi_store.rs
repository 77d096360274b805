use std::{
    path::{Path, PathBuf},
    sync::Arc,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use reelcache_model::CacheRecord;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    eviction::{
        CacheEntryInfo, EvictionPlan, EvictionReason, is_expired, plan_expired,
        plan_oldest_first,
    },
    limits::CacheLimits,
    record_store::{EntryMeta, RecordStore, estimate_payload_bytes},
    stats::{CacheRunStats, CacheRunStatsSnapshot, CacheStatistics},
    store_kind::StoreKind,
};
use crate::{
    error::Result,
    infra::clock::{Clock, SystemClock, duration_to_ms},
    units::ByteSize,
};

/// Outcome of one eviction or expiry pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: u64,
    pub freed_bytes: u64,
    pub removed_ttl: u64,
    pub removed_size: u64,
}

impl CleanupReport {
    fn absorb(&mut self, reason: EvictionReason, size_bytes: u64) {
        self.removed += 1;
        self.freed_bytes = self.freed_bytes.saturating_add(size_bytes);
        match reason {
            EvictionReason::TtlExpired => self.removed_ttl += 1,
            EvictionReason::OverSizeCap => self.removed_size += 1,
        }
    }
}

/// Persistent cache partitioned into four independent stores that share one
/// byte budget and one TTL.
///
/// Storage failures are returned as [`crate::CacheError`] so callers can tell
/// "cache unavailable" apart from a miss (`Ok(None)`).
#[derive(Debug)]
pub struct MultiStoreCache {
    root: PathBuf,
    stores: [RecordStore; StoreKind::COUNT],
    /// Serializes mutations and content reads per store.
    store_locks: [Mutex<()>; StoreKind::COUNT],
    cleanup_lock: Mutex<()>,
    max_bytes: AtomicU64,
    ttl_ms: AtomicU64,
    low_water_ratio_bits: AtomicU64,
    clock: Arc<dyn Clock>,
    stats: CacheRunStats,
}

impl MultiStoreCache {
    pub fn open(root: impl Into<PathBuf>, limits: CacheLimits) -> Result<Self> {
        Self::open_with_clock(root, limits, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        root: impl Into<PathBuf>,
        limits: CacheLimits,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let root = root.into();
        let stores = StoreKind::ALL
            .map(|kind| RecordStore::new(kind, root.join(kind.dir_name())));
        for store in stores.iter() {
            std::fs::create_dir_all(store.root())?;
        }

        info!(
            "multi-store cache opened; root={}, max={}, ttl={}s",
            root.display(),
            limits.max_bytes,
            limits.ttl.as_secs()
        );

        Ok(Self {
            root,
            stores,
            store_locks: std::array::from_fn(|_| Mutex::new(())),
            cleanup_lock: Mutex::new(()),
            max_bytes: AtomicU64::new(limits.max_bytes.as_bytes()),
            ttl_ms: AtomicU64::new(duration_to_ms(limits.ttl)),
            low_water_ratio_bits: AtomicU64::new(
                limits.low_water_ratio.to_bits(),
            ),
            clock,
            stats: CacheRunStats::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_root(&self, kind: StoreKind) -> &Path {
        self.store(kind).root()
    }

    pub fn limits(&self) -> CacheLimits {
        CacheLimits {
            max_bytes: ByteSize::from_bytes(
                self.max_bytes.load(Ordering::Relaxed),
            ),
            ttl: Duration::from_millis(self.ttl_ms.load(Ordering::Relaxed)),
            low_water_ratio: f64::from_bits(
                self.low_water_ratio_bits.load(Ordering::Relaxed),
            ),
        }
    }

    /// Takes effect on the next read, write or cleanup pass.
    pub fn set_limits(&self, limits: CacheLimits) {
        self.max_bytes
            .store(limits.max_bytes.as_bytes(), Ordering::SeqCst);
        self.ttl_ms
            .store(duration_to_ms(limits.ttl), Ordering::SeqCst);
        self.low_water_ratio_bits
            .store(limits.low_water_ratio.to_bits(), Ordering::SeqCst);
    }

    pub fn run_stats(&self) -> CacheRunStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stamps `timestamp = now`, persists, then runs
    /// [`Self::cleanup_if_needed`].
    pub async fn write<T: Serialize>(
        &self,
        kind: StoreKind,
        key: &str,
        payload: &T,
    ) -> Result<()> {
        let now_ms = self.clock.now_ms();
        self.write_at(kind, key, payload, now_ms).await
    }

    /// Like [`Self::write`] with an explicit timestamp (imports, aged
    /// fixtures).
    pub async fn write_at<T: Serialize>(
        &self,
        kind: StoreKind,
        key: &str,
        payload: &T,
        timestamp_ms: u64,
    ) -> Result<()> {
        let size = estimate_payload_bytes(payload)?;
        let record = CacheRecord {
            key: key.to_string(),
            timestamp: timestamp_ms,
            size,
            payload,
        };

        {
            let _guard = self.lock(kind).await;
            self.store(kind).put(&record).await?;
        }
        self.stats.on_write();
        debug!("{kind} write; key={key}, size={size}");

        self.cleanup_if_needed().await?;
        Ok(())
    }

    pub async fn read<T: DeserializeOwned>(
        &self,
        kind: StoreKind,
        key: &str,
    ) -> Result<Option<T>> {
        Ok(self
            .read_record(kind, key)
            .await?
            .map(CacheRecord::into_payload))
    }

    pub async fn read_record<T: DeserializeOwned>(
        &self,
        kind: StoreKind,
        key: &str,
    ) -> Result<Option<CacheRecord<T>>> {
        self.checked_read(kind, key).await
    }

    /// Non-mutating probe of an entry's index metadata; ignores TTL.
    pub async fn entry_meta(
        &self,
        kind: StoreKind,
        key: &str,
    ) -> Result<Option<EntryMeta>> {
        self.store(kind).meta(key).await
    }

    pub async fn contains(&self, kind: StoreKind, key: &str) -> Result<bool> {
        Ok(self.entry_meta(kind, key).await?.is_some())
    }

    pub async fn delete(&self, kind: StoreKind, key: &str) -> Result<()> {
        let _guard = self.lock(kind).await;
        if self.store(kind).remove(key).await? {
            debug!("{kind} delete; key={key}");
        }
        Ok(())
    }

    /// Deletes `key` from every store; returns how many held it.
    pub async fn delete_everywhere(&self, key: &str) -> Result<usize> {
        let mut removed = 0;
        for kind in StoreKind::ALL {
            let _guard = self.lock(kind).await;
            if self.store(kind).remove(key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub async fn clear(&self, kind: StoreKind) -> Result<()> {
        let _guard = self.lock(kind).await;
        self.store(kind).clear().await?;
        info!("{kind} cleared");
        Ok(())
    }

    /// Every record in `kind`, including expired ones not yet swept.
    pub async fn enumerate<T: DeserializeOwned>(
        &self,
        kind: StoreKind,
    ) -> Result<Vec<(String, CacheRecord<T>)>> {
        let store = self.store(kind);
        let listed = store.list().await?;
        let mut out = Vec::with_capacity(listed.len());
        for (key, _) in listed {
            let _guard = self.lock(kind).await;
            // Deleted between listing and reading.
            if let Some(record) = store.get::<T>(&key).await? {
                out.push((key, record));
            }
        }
        Ok(out)
    }

    pub async fn statistics(&self) -> Result<CacheStatistics> {
        let mut stats = CacheStatistics::default();
        for entry in self.collect_entries().await? {
            stats.record(entry.store, entry.size_bytes);
        }
        Ok(stats)
    }

    /// Evicts down to the low-water mark when usage exceeds the ceiling.
    pub async fn cleanup_if_needed(&self) -> Result<Option<CleanupReport>> {
        let limits = self.limits();
        if limits.max_bytes.is_zero() {
            return Ok(None);
        }

        let _guard = self.cleanup_lock.lock().await;
        let start = Instant::now();
        let entries = self.collect_entries().await?;
        let total: u64 = entries.iter().map(|e| e.size_bytes).sum();

        let Some(to_free) = limits.overflow_to_free(total) else {
            return Ok(None);
        };

        info!(
            "cache over budget; total={}, max={}, freeing={}",
            ByteSize::from_bytes(total),
            limits.max_bytes,
            ByteSize::from_bytes(to_free)
        );
        let plan = plan_oldest_first(entries, to_free);
        let report = self.apply_plan(plan).await?;
        self.finish_cleanup(&report, start);
        Ok(Some(report))
    }

    /// Deletes oldest records across all stores until `bytes_to_free` is
    /// covered.
    pub async fn remove_oldest(
        &self,
        bytes_to_free: u64,
    ) -> Result<CleanupReport> {
        let _guard = self.cleanup_lock.lock().await;
        let start = Instant::now();
        let entries = self.collect_entries().await?;
        let plan = plan_oldest_first(entries, bytes_to_free);
        let report = self.apply_plan(plan).await?;
        self.finish_cleanup(&report, start);
        Ok(report)
    }

    /// Explicit sweep of every expired record in every store.
    pub async fn cleanup_expired(&self) -> Result<CleanupReport> {
        let _guard = self.cleanup_lock.lock().await;
        let start = Instant::now();
        let ttl_ms = self.ttl_ms.load(Ordering::Relaxed);
        let entries = self.collect_entries().await?;
        let plan = plan_expired(entries, self.clock.now_ms(), ttl_ms);
        let report = self.apply_plan(plan).await?;
        self.finish_cleanup(&report, start);
        Ok(report)
    }

    /// Read that deletes the record and reports a miss when it has outlived
    /// the TTL. Repeated reads of an expired key keep returning `None`.
    ///
    /// Runs under the store lock: an overwrite or eviction drops content
    /// blobs, and a lookup racing it would see the key but not its bytes.
    async fn checked_read<T: DeserializeOwned>(
        &self,
        kind: StoreKind,
        key: &str,
    ) -> Result<Option<CacheRecord<T>>> {
        let store = self.store(kind);
        let _guard = self.lock(kind).await;
        let Some(record) = store.get::<T>(key).await? else {
            self.stats.on_miss();
            return Ok(None);
        };

        let ttl_ms = self.ttl_ms.load(Ordering::Relaxed);
        let now_ms = self.clock.now_ms();
        if !is_expired(record.timestamp, now_ms, ttl_ms) {
            self.stats.on_hit();
            return Ok(Some(record));
        }

        store.remove(key).await?;
        self.stats.on_lazy_expiry();
        self.stats.on_miss();
        debug!(
            "{kind} lazy expiry; key={key}, age_ms={}",
            record.age_ms(now_ms)
        );
        Ok(None)
    }

    async fn collect_entries(&self) -> Result<Vec<CacheEntryInfo>> {
        let mut out = Vec::new();
        for store in self.stores.iter() {
            for (key, meta) in store.list().await? {
                out.push(CacheEntryInfo {
                    store: store.kind(),
                    key,
                    size_bytes: meta.size,
                    timestamp_ms: meta.timestamp,
                });
            }
        }
        Ok(out)
    }

    async fn apply_plan(&self, plan: EvictionPlan) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        for eviction in plan.planned {
            let _guard = self.lock(eviction.store).await;
            let store = self.store(eviction.store);
            // Rewritten since planning: the entry is fresh, leave it.
            let unchanged = store
                .meta(&eviction.key)
                .await?
                .is_some_and(|m| m.timestamp == eviction.timestamp_ms);
            if !unchanged {
                continue;
            }

            match store.remove(&eviction.key).await {
                Ok(true) => report.absorb(eviction.reason, eviction.size_bytes),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        "{} eviction failed; key={}, err={e}",
                        eviction.store, eviction.key
                    );
                    return Err(e);
                }
            }
        }
        Ok(report)
    }

    fn finish_cleanup(&self, report: &CleanupReport, start: Instant) {
        let duration_ms = duration_to_ms(start.elapsed());
        self.stats.on_cleanup_finished(
            report.removed_ttl,
            report.removed_size,
            duration_ms,
        );
        if report.removed > 0 {
            info!(
                "cache cleanup removed {} entries (ttl={}, size={}), \
                 freed {} in {}ms",
                report.removed,
                report.removed_ttl,
                report.removed_size,
                ByteSize::from_bytes(report.freed_bytes),
                duration_ms
            );
        }
    }

    fn store(&self, kind: StoreKind) -> &RecordStore {
        &self.stores[kind.index()]
    }

    async fn lock(&self, kind: StoreKind) -> tokio::sync::MutexGuard<'_, ()> {
        self.store_locks[kind.index()].lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::MultiStoreCache;
    use crate::{
        infra::{cache::CacheLimits, cache::StoreKind, clock::ManualClock},
        units::ByteSize,
    };
    use std::{sync::Arc, time::Duration};
    use tempfile::tempdir;

    fn small_limits(max: u64) -> CacheLimits {
        CacheLimits {
            max_bytes: ByteSize::from_bytes(max),
            ttl: Duration::from_secs(60),
            low_water_ratio: 0.8,
        }
    }

    #[tokio::test]
    async fn expired_record_survives_until_read() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cache = MultiStoreCache::open_with_clock(
            dir.path(),
            small_limits(0),
            clock.clone(),
        )
        .unwrap();

        cache
            .write(StoreKind::Subtitle, "file-1", &"hello".to_string())
            .await
            .unwrap();
        clock.advance(Duration::from_secs(61));

        // Nothing sweeps in the background.
        assert!(cache.contains(StoreKind::Subtitle, "file-1").await.unwrap());
        let read: Option<String> =
            cache.read(StoreKind::Subtitle, "file-1").await.unwrap();
        assert!(read.is_none());
        assert!(!cache.contains(StoreKind::Subtitle, "file-1").await.unwrap());
        assert_eq!(cache.run_stats().lazy_expirations, 1);
    }

    #[tokio::test]
    async fn rewrite_after_planning_is_not_evicted() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(10_000));
        let cache = MultiStoreCache::open_with_clock(
            dir.path(),
            small_limits(0),
            clock.clone(),
        )
        .unwrap();

        cache
            .write_at(StoreKind::Preview, "k", &"old".to_string(), 1)
            .await
            .unwrap();
        let entries = cache.collect_entries().await.unwrap();
        let plan = super::plan_oldest_first(entries, 1);

        cache
            .write(StoreKind::Preview, "k", &"new".to_string())
            .await
            .unwrap();
        let report = cache.apply_plan(plan).await.unwrap();

        assert_eq!(report.removed, 0);
        let read: Option<String> =
            cache.read(StoreKind::Preview, "k").await.unwrap();
        assert_eq!(read.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn set_limits_round_trips() {
        let dir = tempdir().unwrap();
        let cache =
            MultiStoreCache::open(dir.path(), CacheLimits::defaults()).unwrap();
        let limits = small_limits(4096);
        cache.set_limits(limits.clone());
        assert_eq!(cache.limits(), limits);
    }
}
