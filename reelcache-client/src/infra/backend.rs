// Native backend seam: preview data, generation commands and video registration

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reelcache_model::{
    FileId, MediaPreviewData, RecognitionFrame, SubtitleFrame, ThumbnailData,
    TimelineFrame, VideoRegistration,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Commands the native side of the editor answers.
///
/// The backend owns canonical preview data; this layer only reads it and
/// mirrors sub-fields into the local stores.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn get_media_preview_data(
        &self,
        file_id: &FileId,
    ) -> Result<Option<MediaPreviewData>>;

    async fn generate_media_thumbnail(
        &self,
        file_id: &FileId,
        file_path: &Path,
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Result<ThumbnailData>;

    async fn clear_media_preview_data(&self, file_id: &FileId) -> Result<()>;

    async fn save_timeline_frames(
        &self,
        file_id: &FileId,
        frames: &[TimelineFrame],
    ) -> Result<()>;

    async fn get_files_with_previews(&self) -> Result<Vec<FileId>>;

    async fn save_preview_data(&self, path: &Path) -> Result<()>;

    async fn load_preview_data(&self, path: &Path) -> Result<()>;

    async fn register_video(&self, path: &Path) -> Result<VideoRegistration>;

    async fn extract_timeline_frames(
        &self,
        file_id: &FileId,
        file_path: &Path,
        count: u32,
    ) -> Result<Vec<TimelineFrame>>;

    async fn extract_frame_at(
        &self,
        file_id: &FileId,
        file_path: &Path,
        timestamp: f64,
    ) -> Result<TimelineFrame>;

    async fn generate_recognition_frames(
        &self,
        file_id: &FileId,
        file_path: &Path,
        interval_secs: f64,
    ) -> Result<Vec<RecognitionFrame>>;

    async fn generate_subtitle_frames(
        &self,
        file_id: &FileId,
        file_path: &Path,
    ) -> Result<Vec<SubtitleFrame>>;
}

/// Raw name-plus-JSON-arguments invocation, as exposed by desktop shells.
#[async_trait]
pub trait CommandBridge: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value>;
}

/// [`MediaBackend`] over a [`CommandBridge`], decoding every response.
#[derive(Debug, Clone)]
pub struct BridgeBackend<B> {
    bridge: B,
}

impl<B: CommandBridge> BridgeBackend<B> {
    pub fn new(bridge: B) -> Self {
        Self { bridge }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        command: &str,
        args: Value,
    ) -> Result<T> {
        let raw = self
            .bridge
            .invoke(command, args)
            .await
            .with_context(|| format!("{command} failed"))?;
        decode_response(command, raw)
    }

    async fn call_unit(&self, command: &str, args: Value) -> Result<()> {
        self.bridge
            .invoke(command, args)
            .await
            .with_context(|| format!("{command} failed"))?;
        Ok(())
    }
}

/// Decodes a command response.
///
/// Some commands answer with JSON text instead of a JSON value; a string
/// response is parsed as JSON before decoding, and text that is not JSON is
/// an error.
pub fn decode_response<T: DeserializeOwned>(
    command: &str,
    raw: Value,
) -> Result<T> {
    let value = match raw {
        Value::String(text) => serde_json::from_str(&text).with_context(|| {
            format!("{command} returned a non-JSON response")
        })?,
        other => other,
    };
    serde_json::from_value(value)
        .with_context(|| format!("{command} returned an unexpected payload"))
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl<B: CommandBridge> MediaBackend for BridgeBackend<B> {
    async fn get_media_preview_data(
        &self,
        file_id: &FileId,
    ) -> Result<Option<MediaPreviewData>> {
        self.call("get_media_preview_data", json!({ "fileId": file_id }))
            .await
    }

    async fn generate_media_thumbnail(
        &self,
        file_id: &FileId,
        file_path: &Path,
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Result<ThumbnailData> {
        self.call(
            "generate_media_thumbnail",
            json!({
                "fileId": file_id,
                "filePath": path_arg(file_path),
                "width": width,
                "height": height,
                "timestamp": timestamp,
            }),
        )
        .await
    }

    async fn clear_media_preview_data(&self, file_id: &FileId) -> Result<()> {
        self.call_unit("clear_media_preview_data", json!({ "fileId": file_id }))
            .await
    }

    async fn save_timeline_frames(
        &self,
        file_id: &FileId,
        frames: &[TimelineFrame],
    ) -> Result<()> {
        self.call_unit(
            "save_timeline_frames",
            json!({ "fileId": file_id, "frames": frames }),
        )
        .await
    }

    async fn get_files_with_previews(&self) -> Result<Vec<FileId>> {
        self.call("get_files_with_previews", json!({})).await
    }

    async fn save_preview_data(&self, path: &Path) -> Result<()> {
        self.call_unit("save_preview_data", json!({ "path": path_arg(path) }))
            .await
    }

    async fn load_preview_data(&self, path: &Path) -> Result<()> {
        self.call_unit("load_preview_data", json!({ "path": path_arg(path) }))
            .await
    }

    async fn register_video(&self, path: &Path) -> Result<VideoRegistration> {
        self.call("register_video", json!({ "path": path_arg(path) }))
            .await
    }

    async fn extract_timeline_frames(
        &self,
        file_id: &FileId,
        file_path: &Path,
        count: u32,
    ) -> Result<Vec<TimelineFrame>> {
        self.call(
            "extract_timeline_frames",
            json!({
                "fileId": file_id,
                "filePath": path_arg(file_path),
                "count": count,
            }),
        )
        .await
    }

    async fn extract_frame_at(
        &self,
        file_id: &FileId,
        file_path: &Path,
        timestamp: f64,
    ) -> Result<TimelineFrame> {
        self.call(
            "extract_frame_at",
            json!({
                "fileId": file_id,
                "filePath": path_arg(file_path),
                "timestamp": timestamp,
            }),
        )
        .await
    }

    async fn generate_recognition_frames(
        &self,
        file_id: &FileId,
        file_path: &Path,
        interval_secs: f64,
    ) -> Result<Vec<RecognitionFrame>> {
        self.call(
            "generate_recognition_frames",
            json!({
                "fileId": file_id,
                "filePath": path_arg(file_path),
                "interval": interval_secs,
            }),
        )
        .await
    }

    async fn generate_subtitle_frames(
        &self,
        file_id: &FileId,
        file_path: &Path,
    ) -> Result<Vec<SubtitleFrame>> {
        self.call(
            "generate_subtitle_frames",
            json!({ "fileId": file_id, "filePath": path_arg(file_path) }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Default)]
    struct CannedBridge {
        response: Mutex<Value>,
        seen: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl CommandBridge for CannedBridge {
        async fn invoke(&self, command: &str, args: Value) -> Result<Value> {
            self.seen.lock().push((command.to_string(), args));
            Ok(self.response.lock().clone())
        }
    }

    fn backend(response: Value) -> BridgeBackend<CannedBridge> {
        BridgeBackend::new(CannedBridge {
            response: Mutex::new(response),
            ..CannedBridge::default()
        })
    }

    #[tokio::test]
    async fn thumbnail_command_sends_camel_case_args() {
        let backend = backend(json!({ "base64_data": "aGk=", "width": 320 }));
        let id = FileId::new("file-1").unwrap();

        let thumb = backend
            .generate_media_thumbnail(&id, Path::new("/a.mp4"), 320, 180, 0.0)
            .await
            .unwrap();

        assert_eq!(thumb.base64_data, "aGk=");
        assert_eq!(thumb.width, 320);
        let seen = backend.bridge.seen.lock();
        assert_eq!(seen[0].0, "generate_media_thumbnail");
        assert_eq!(seen[0].1["fileId"], "file-1");
        assert_eq!(seen[0].1["filePath"], "/a.mp4");
    }

    #[tokio::test]
    async fn json_text_responses_are_parsed() {
        let backend =
            backend(Value::String(r#"{"id":"v1","url":"http://x/v1"}"#.into()));

        let reg = backend.register_video(Path::new("/a.mp4")).await.unwrap();

        assert_eq!(reg.url, "http://x/v1");
    }

    #[tokio::test]
    async fn non_json_thumbnail_response_is_an_error() {
        let backend = backend(Value::String("not json at all".into()));
        let id = FileId::new("file-1").unwrap();

        let err = backend
            .generate_media_thumbnail(&id, Path::new("/a.mp4"), 1, 1, 0.0)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("non-JSON"));
    }

    #[tokio::test]
    async fn missing_preview_data_decodes_to_none() {
        let backend = backend(Value::Null);
        let id = FileId::new("file-1").unwrap();

        assert!(backend.get_media_preview_data(&id).await.unwrap().is_none());
    }
}
