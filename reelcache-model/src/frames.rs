/// Anything positioned on the media timeline by a timestamp in seconds.
pub trait TimestampedFrame {
    fn timestamp_secs(&self) -> f64;
}

/// A single extracted timeline frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TimelineFrame {
    /// Position in seconds.
    pub timestamp: f64,
    /// Encoded image (base64).
    pub frame_data: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_keyframe: bool,
}

impl TimelineFrame {
    pub fn new(timestamp: f64, frame_data: impl Into<String>) -> Self {
        Self {
            timestamp,
            frame_data: frame_data.into(),
            is_keyframe: false,
        }
    }

    pub fn keyframe(mut self) -> Self {
        self.is_keyframe = true;
        self
    }
}

impl TimestampedFrame for TimelineFrame {
    fn timestamp_secs(&self) -> f64 {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Recognition annotations (objects, faces) at one point on the timeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecognitionFrame {
    pub timestamp: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub objects: Vec<DetectedObject>,
}

impl TimestampedFrame for RecognitionFrame {
    fn timestamp_secs(&self) -> f64 {
        self.timestamp
    }
}

/// Subtitle text visible at one point on the timeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubtitleFrame {
    pub timestamp: f64,
    pub text: String,
}

impl TimestampedFrame for SubtitleFrame {
    fn timestamp_secs(&self) -> f64 {
        self.timestamp
    }
}
