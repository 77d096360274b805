use std::time::Duration;

use crate::units::ByteSize;

/// Budget and expiry policy shared by all four stores.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLimits {
    /// Global ceiling across every store. Zero disables size eviction.
    pub max_bytes: ByteSize,
    /// Maximum record age. Zero disables expiry.
    pub ttl: Duration,
    /// Fraction of `max_bytes` that an over-budget eviction brings usage
    /// back down to.
    pub low_water_ratio: f64,
}

impl CacheLimits {
    pub const DEFAULT_LOW_WATER_RATIO: f64 = 0.8;

    pub const fn defaults() -> Self {
        Self {
            max_bytes: ByteSize::from_mib(500),
            ttl: Duration::from_secs(30 * 24 * 60 * 60),
            low_water_ratio: Self::DEFAULT_LOW_WATER_RATIO,
        }
    }

    pub fn low_water_mark(&self) -> ByteSize {
        self.max_bytes.scaled(self.low_water_ratio)
    }

    /// Bytes to free when `total_bytes` is over the ceiling, `None` otherwise.
    pub fn overflow_to_free(&self, total_bytes: u64) -> Option<u64> {
        let max = self.max_bytes.as_bytes();
        if max == 0 || total_bytes <= max {
            return None;
        }
        Some(total_bytes.saturating_sub(self.low_water_mark().as_bytes()))
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::CacheLimits;
    use crate::units::ByteSize;

    #[test]
    fn overflow_frees_down_to_low_water_mark() {
        let limits = CacheLimits {
            max_bytes: ByteSize::from_bytes(1_000),
            ..CacheLimits::defaults()
        };
        assert_eq!(limits.overflow_to_free(1_000), None);
        assert_eq!(limits.overflow_to_free(1_001), Some(201));
        assert_eq!(limits.overflow_to_free(1_500), Some(700));
    }

    #[test]
    fn zero_ceiling_never_overflows() {
        let limits = CacheLimits {
            max_bytes: ByteSize::ZERO,
            ..CacheLimits::defaults()
        };
        assert_eq!(limits.overflow_to_free(u64::MAX), None);
    }
}
