use crate::frames::{RecognitionFrame, SubtitleFrame, TimelineFrame};

/// Envelope shared by every persisted cache entry.
///
/// `size` is the byte estimate of the serialized payload taken when the
/// record was written and is never recomputed afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheRecord<T> {
    pub key: String,
    /// Unix epoch milliseconds at write time.
    pub timestamp: u64,
    pub size: u64,
    pub payload: T,
}

impl<T> CacheRecord<T> {
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

pub type CachedPreview = CacheRecord<String>;
pub type CachedFrames = CacheRecord<Vec<TimelineFrame>>;
pub type CachedRecognitionFrames = CacheRecord<Vec<RecognitionFrame>>;
pub type CachedSubtitleFrames = CacheRecord<Vec<SubtitleFrame>>;
