//! On-disk cache infra.
//!
//! [`MultiStoreCache`] owns four `cacache` directories, one per
//! [`StoreKind`], and enforces the shared byte budget and TTL from
//! [`CacheLimits`].

mod eviction;
mod limits;
mod multi_store;
mod record_store;
mod stats;
mod store_kind;

pub use eviction::{
    CacheEntryInfo, EvictionPlan, EvictionReason, PlannedEviction,
    plan_expired, plan_oldest_first,
};
pub use limits::CacheLimits;
pub use multi_store::{CleanupReport, MultiStoreCache};
pub use record_store::{EntryMeta, RecordStore, estimate_payload_bytes};
pub use stats::{
    CacheRunStats, CacheRunStatsSnapshot, CacheStatistics, StoreStatistics,
};
pub use store_kind::StoreKind;
