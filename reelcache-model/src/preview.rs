use chrono::{DateTime, Utc};

use crate::{
    error::{ModelError, Result},
    frames::{RecognitionFrame, SubtitleFrame, TimelineFrame},
    ids::FileId,
};

/// Thumbnail payload as returned by the backend generation command.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThumbnailData {
    pub base64_data: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp: f64,
}

impl ThumbnailData {
    pub fn new(base64_data: impl Into<String>) -> Self {
        Self {
            base64_data: base64_data.into(),
            width: 0,
            height: 0,
            timestamp: 0.0,
        }
    }

    /// Rejects empty image data and data containing characters outside the
    /// base64 alphabets (standard and URL-safe).
    ///
    /// Data URLs (`data:image/jpeg;base64,...`) are accepted; only the part
    /// after the comma is checked. Content is not decoded.
    pub fn validate(&self) -> Result<()> {
        let raw = self
            .base64_data
            .split_once(',')
            .filter(|(prefix, _)| prefix.starts_with("data:"))
            .map(|(_, data)| data)
            .unwrap_or(&self.base64_data)
            .trim();

        if raw.is_empty() {
            return Err(ModelError::InvalidPayload(
                "thumbnail data is empty".to_string(),
            ));
        }

        if let Some(bad) = raw.chars().find(|c| !is_base64_char(*c)) {
            return Err(ModelError::InvalidPayload(format!(
                "thumbnail data is not base64: unexpected {bad:?}"
            )));
        }

        Ok(())
    }
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '-' | '_' | '=')
}

/// The backend's canonical preview record for one file.
///
/// Read-only from this layer's point of view: only the thumbnail and frame
/// sub-fields are ever copied into the local cache.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaPreviewData {
    pub file_id: FileId,
    pub file_path: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub browser_thumbnail: Option<ThumbnailData>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timeline_previews: Vec<ThumbnailData>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timeline_frames: Vec<TimelineFrame>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub recognition_frames: Vec<RecognitionFrame>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub recognition_results: Option<serde_json::Value>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub subtitle_frames: Vec<SubtitleFrame>,
    pub last_updated: DateTime<Utc>,
}

impl MediaPreviewData {
    pub fn new(file_id: FileId, file_path: impl Into<String>) -> Self {
        Self {
            file_id,
            file_path: file_path.into(),
            browser_thumbnail: None,
            timeline_previews: Vec::new(),
            timeline_frames: Vec::new(),
            recognition_frames: Vec::new(),
            recognition_results: None,
            subtitle_frames: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// The browser thumbnail's encoded data, if the backend has produced one.
    pub fn thumbnail_data(&self) -> Option<&str> {
        self.browser_thumbnail
            .as_ref()
            .map(|thumb| thumb.base64_data.as_str())
            .filter(|data| !data.is_empty())
    }
}
