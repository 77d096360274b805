//! Persistent, size-bounded cache for media previews and extracted frames.
//!
//! Four independent `cacache` stores (preview thumbnails, timeline frames,
//! recognition frames, subtitle frames) share one global byte budget and one
//! time-to-live policy. See [`infra::cache::MultiStoreCache`].
#![allow(missing_docs)]

pub mod error;
pub mod infra;
pub mod units;

pub use error::{CacheError, Result};
pub use infra::cache::{
    CacheLimits, CacheRunStatsSnapshot, CacheStatistics, CleanupReport,
    EntryMeta, EvictionReason, MultiStoreCache, StoreKind, StoreStatistics,
};
pub use infra::clock::{Clock, ManualClock, SystemClock};
pub use units::ByteSize;
