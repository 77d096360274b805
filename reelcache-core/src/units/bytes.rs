use std::{fmt, str::FromStr};

/// Byte count used for cache budgets and record sizes.
///
/// Base-2 units (KiB, MiB, GiB), matching what the OS reports for the
/// cache directories.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const ZERO: Self = Self(0);
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * 1024 * 1024;

    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn from_kib(kib: u64) -> Self {
        Self(kib.saturating_mul(Self::KIB))
    }

    pub const fn from_mib(mib: u64) -> Self {
        Self(mib.saturating_mul(Self::MIB))
    }

    pub const fn from_gib(gib: u64) -> Self {
        Self(gib.saturating_mul(Self::GIB))
    }

    pub const fn as_bytes(self) -> u64 {
        self.0
    }

    pub fn as_mib(self) -> f64 {
        self.0 as f64 / Self::MIB as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self * ratio`, rounded down. Ratios outside `0.0..=1.0` are clamped.
    pub fn scaled(self, ratio: f64) -> Self {
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self((self.0 as f64 * ratio).floor() as u64)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Debug for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0 as f64;
        if self.0 >= Self::GIB {
            write!(f, "{:.2} GiB", bytes / Self::GIB as f64)
        } else if self.0 >= Self::MIB {
            write!(f, "{:.1} MiB", bytes / Self::MIB as f64)
        } else if self.0 >= Self::KIB {
            write!(f, "{:.1} KiB", bytes / Self::KIB as f64)
        } else {
            write!(f, "{} B", self.0)
        }
    }
}

/// Parses `"1048576"`, `"512KiB"`, `"500MiB"`, `"2GiB"` (unit suffix is
/// case-insensitive; `KB`/`MB`/`GB` are read as base-2 too).
impl FromStr for ByteSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split_at = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, unit) = trimmed.split_at(split_at);
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("invalid byte size: {s:?}"))?;

        let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
            "" | "b" => 1,
            "k" | "kb" | "kib" => Self::KIB,
            "m" | "mb" | "mib" => Self::MIB,
            "g" | "gb" | "gib" => Self::GIB,
            other => return Err(format!("unknown byte size unit: {other:?}")),
        };

        Ok(Self(value.saturating_mul(multiplier)))
    }
}

#[cfg(test)]
mod tests {
    use super::ByteSize;

    #[test]
    fn parses_suffixed_sizes() {
        assert_eq!("4096".parse::<ByteSize>().unwrap().as_bytes(), 4096);
        assert_eq!(
            "500MiB".parse::<ByteSize>().unwrap(),
            ByteSize::from_mib(500)
        );
        assert_eq!("2 gb".parse::<ByteSize>().unwrap(), ByteSize::from_gib(2));
        assert!("12 parsecs".parse::<ByteSize>().is_err());
        assert!("MiB".parse::<ByteSize>().is_err());
    }

    #[test]
    fn scaled_rounds_down_and_clamps() {
        let max = ByteSize::from_bytes(1001);
        assert_eq!(max.scaled(0.8).as_bytes(), 800);
        assert_eq!(max.scaled(2.0), max);
        assert_eq!(max.scaled(-1.0), ByteSize::ZERO);
    }
}
