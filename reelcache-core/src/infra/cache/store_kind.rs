use std::{fmt, str::FromStr};

/// The four logical stores. Each one is an independent `cacache` root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKind {
    Preview,
    Frames,
    Recognition,
    Subtitle,
}

impl StoreKind {
    pub const COUNT: usize = 4;

    /// Enumeration order; also the tie-break order for eviction.
    pub const ALL: [StoreKind; Self::COUNT] = [
        StoreKind::Preview,
        StoreKind::Frames,
        StoreKind::Recognition,
        StoreKind::Subtitle,
    ];

    /// Directory name under the cache root.
    pub const fn dir_name(self) -> &'static str {
        match self {
            StoreKind::Preview => "preview-store",
            StoreKind::Frames => "frame-store",
            StoreKind::Recognition => "recognition-store",
            StoreKind::Subtitle => "subtitle-store",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            StoreKind::Preview => 0,
            StoreKind::Frames => 1,
            StoreKind::Recognition => 2,
            StoreKind::Subtitle => 3,
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preview" | "preview-store" => Ok(StoreKind::Preview),
            "frames" | "frame" | "frame-store" => Ok(StoreKind::Frames),
            "recognition" | "recognition-store" => Ok(StoreKind::Recognition),
            "subtitle" | "subtitles" | "subtitle-store" => {
                Ok(StoreKind::Subtitle)
            }
            other => Err(format!("unknown store: {other:?}")),
        }
    }
}
