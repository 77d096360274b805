use super::store_kind::StoreKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    TtlExpired,
    OverSizeCap,
}

/// One indexed record, as seen by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub store: StoreKind,
    pub key: String,
    pub size_bytes: u64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEviction {
    pub store: StoreKind,
    pub key: String,
    pub size_bytes: u64,
    /// Timestamp the plan was made against; an entry rewritten since then
    /// carries a different one and must be left alone.
    pub timestamp_ms: u64,
    pub reason: EvictionReason,
}

#[derive(Debug, Default)]
pub struct EvictionPlan {
    pub planned: Vec<PlannedEviction>,
    pub total_bytes_before: u64,
    pub bytes_planned: u64,
}

impl EvictionPlan {
    fn push(&mut self, entry: CacheEntryInfo, reason: EvictionReason) {
        self.bytes_planned =
            self.bytes_planned.saturating_add(entry.size_bytes);
        self.planned.push(PlannedEviction {
            store: entry.store,
            key: entry.key,
            size_bytes: entry.size_bytes,
            timestamp_ms: entry.timestamp_ms,
            reason,
        });
    }
}

/// Oldest-first across all stores until at least `bytes_to_free` is covered.
///
/// The sort is stable, so equal timestamps keep the order `entries` arrived
/// in. Stops on the first entry that crosses the threshold: the plan never
/// undershoots (unless the pool runs out) and overshoots by at most that
/// last entry.
pub fn plan_oldest_first(
    mut entries: Vec<CacheEntryInfo>,
    bytes_to_free: u64,
) -> EvictionPlan {
    let mut plan = EvictionPlan {
        total_bytes_before: entries.iter().map(|e| e.size_bytes).sum(),
        ..EvictionPlan::default()
    };

    if bytes_to_free == 0 {
        return plan;
    }

    entries.sort_by_key(|e| e.timestamp_ms);
    for e in entries {
        if plan.bytes_planned >= bytes_to_free {
            break;
        }
        plan.push(e, EvictionReason::OverSizeCap);
    }

    plan
}

/// Every entry whose age is strictly greater than `ttl_ms`.
pub fn plan_expired(
    entries: Vec<CacheEntryInfo>,
    now_ms: u64,
    ttl_ms: u64,
) -> EvictionPlan {
    let mut plan = EvictionPlan {
        total_bytes_before: entries.iter().map(|e| e.size_bytes).sum(),
        ..EvictionPlan::default()
    };

    if ttl_ms == 0 {
        return plan;
    }

    for e in entries {
        if is_expired(e.timestamp_ms, now_ms, ttl_ms) {
            plan.push(e, EvictionReason::TtlExpired);
        }
    }

    plan
}

pub(crate) fn is_expired(timestamp_ms: u64, now_ms: u64, ttl_ms: u64) -> bool {
    ttl_ms > 0 && now_ms.saturating_sub(timestamp_ms) > ttl_ms
}
