//! Core data model definitions shared across reelcache crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod error;
pub mod frames;
pub mod ids;
pub mod preview;
pub mod record;
pub mod registration;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use frames::{
    BoundingBox, DetectedObject, RecognitionFrame, SubtitleFrame,
    TimelineFrame, TimestampedFrame,
};
pub use ids::FileId;
pub use preview::{MediaPreviewData, ThumbnailData};
pub use record::{
    CacheRecord, CachedFrames, CachedPreview, CachedRecognitionFrames,
    CachedSubtitleFrames,
};
pub use registration::VideoRegistration;
