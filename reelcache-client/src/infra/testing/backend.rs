use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use reelcache_model::{
    FileId, MediaPreviewData, RecognitionFrame, SubtitleFrame, ThumbnailData,
    TimelineFrame, VideoRegistration,
};

use crate::infra::backend::MediaBackend;

/// Scriptable [`MediaBackend`].
///
/// Generation commands fail until a response is configured; `register_video`
/// fails while no registration is set.
#[derive(Debug, Default)]
pub struct FakeBackend {
    preview_data: Mutex<HashMap<FileId, MediaPreviewData>>,
    thumbnail: Mutex<Option<ThumbnailData>>,
    timeline_frames: Mutex<Option<Vec<TimelineFrame>>>,
    frame_at: Mutex<Option<TimelineFrame>>,
    recognition_frames: Mutex<Option<Vec<RecognitionFrame>>>,
    subtitle_frames: Mutex<Option<Vec<SubtitleFrame>>>,
    registration: Mutex<Option<VideoRegistration>>,
    registration_delay: Mutex<Duration>,
    command_delay: Mutex<Duration>,
    fail_clear: Mutex<bool>,
    fail_save_frames: Mutex<bool>,
    fail_lookup: Mutex<bool>,
    saved_frames: Mutex<HashMap<FileId, Vec<TimelineFrame>>>,
    persisted_to: Mutex<Vec<PathBuf>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn set_preview_data(&self, data: MediaPreviewData) {
        self.preview_data.lock().insert(data.file_id.clone(), data);
    }

    pub fn set_thumbnail(&self, thumbnail: Option<ThumbnailData>) {
        *self.thumbnail.lock() = thumbnail;
    }

    pub fn set_timeline_frames(&self, frames: Option<Vec<TimelineFrame>>) {
        *self.timeline_frames.lock() = frames;
    }

    pub fn set_frame_at(&self, frame: Option<TimelineFrame>) {
        *self.frame_at.lock() = frame;
    }

    pub fn set_recognition_frames(
        &self,
        frames: Option<Vec<RecognitionFrame>>,
    ) {
        *self.recognition_frames.lock() = frames;
    }

    pub fn set_subtitle_frames(&self, frames: Option<Vec<SubtitleFrame>>) {
        *self.subtitle_frames.lock() = frames;
    }

    pub fn set_registration(&self, registration: Option<VideoRegistration>) {
        *self.registration.lock() = registration;
    }

    /// Delay applied inside `register_video`.
    pub fn set_registration_delay(&self, delay: Duration) {
        *self.registration_delay.lock() = delay;
    }

    /// Delay applied inside lookup and generation commands.
    pub fn set_command_delay(&self, delay: Duration) {
        *self.command_delay.lock() = delay;
    }

    pub fn fail_clear(&self, fail: bool) {
        *self.fail_clear.lock() = fail;
    }

    pub fn fail_save_frames(&self, fail: bool) {
        *self.fail_save_frames.lock() = fail;
    }

    pub fn fail_lookup(&self, fail: bool) {
        *self.fail_lookup.lock() = fail;
    }

    pub fn saved_frames(&self, file_id: &FileId) -> Option<Vec<TimelineFrame>> {
        self.saved_frames.lock().get(file_id).cloned()
    }

    /// Paths passed to `save_preview_data` / `load_preview_data`.
    pub fn persisted_to(&self) -> Vec<PathBuf> {
        self.persisted_to.lock().clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == command).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, command: &str) {
        self.calls.lock().push(command.to_string());
    }

    async fn command_delay(&self) {
        let delay = *self.command_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn get_media_preview_data(
        &self,
        file_id: &FileId,
    ) -> Result<Option<MediaPreviewData>> {
        self.record("get_media_preview_data");
        self.command_delay().await;
        if *self.fail_lookup.lock() {
            bail!("preview database unavailable");
        }
        Ok(self.preview_data.lock().get(file_id).cloned())
    }

    async fn generate_media_thumbnail(
        &self,
        _file_id: &FileId,
        _file_path: &Path,
        _width: u32,
        _height: u32,
        _timestamp: f64,
    ) -> Result<ThumbnailData> {
        self.record("generate_media_thumbnail");
        self.command_delay().await;
        self.thumbnail
            .lock()
            .clone()
            .ok_or_else(|| anyhow!("thumbnail generation failed"))
    }

    async fn clear_media_preview_data(&self, file_id: &FileId) -> Result<()> {
        self.record("clear_media_preview_data");
        if *self.fail_clear.lock() {
            bail!("clear refused");
        }
        self.preview_data.lock().remove(file_id);
        Ok(())
    }

    async fn save_timeline_frames(
        &self,
        file_id: &FileId,
        frames: &[TimelineFrame],
    ) -> Result<()> {
        self.record("save_timeline_frames");
        if *self.fail_save_frames.lock() {
            bail!("frame store is read-only");
        }
        self.saved_frames
            .lock()
            .insert(file_id.clone(), frames.to_vec());
        Ok(())
    }

    async fn get_files_with_previews(&self) -> Result<Vec<FileId>> {
        self.record("get_files_with_previews");
        if *self.fail_lookup.lock() {
            bail!("preview database unavailable");
        }
        let mut files: Vec<FileId> =
            self.preview_data.lock().keys().cloned().collect();
        files.sort();
        Ok(files)
    }

    async fn save_preview_data(&self, path: &Path) -> Result<()> {
        self.record("save_preview_data");
        if path.as_os_str().is_empty() {
            bail!("no export path");
        }
        self.persisted_to.lock().push(path.to_path_buf());
        Ok(())
    }

    async fn load_preview_data(&self, path: &Path) -> Result<()> {
        self.record("load_preview_data");
        if path.as_os_str().is_empty() {
            bail!("no import path");
        }
        self.persisted_to.lock().push(path.to_path_buf());
        Ok(())
    }

    async fn register_video(&self, path: &Path) -> Result<VideoRegistration> {
        self.record("register_video");
        let delay = *self.registration_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.registration.lock().clone().ok_or_else(|| {
            anyhow!("native registration unavailable for {}", path.display())
        })
    }

    async fn extract_timeline_frames(
        &self,
        _file_id: &FileId,
        _file_path: &Path,
        count: u32,
    ) -> Result<Vec<TimelineFrame>> {
        self.record("extract_timeline_frames");
        self.command_delay().await;
        let frames = self
            .timeline_frames
            .lock()
            .clone()
            .ok_or_else(|| anyhow!("frame extraction failed"))?;
        Ok(frames.into_iter().take(count as usize).collect())
    }

    async fn extract_frame_at(
        &self,
        _file_id: &FileId,
        _file_path: &Path,
        timestamp: f64,
    ) -> Result<TimelineFrame> {
        self.record("extract_frame_at");
        self.frame_at
            .lock()
            .clone()
            .map(|frame| TimelineFrame { timestamp, ..frame })
            .ok_or_else(|| anyhow!("frame extraction failed"))
    }

    async fn generate_recognition_frames(
        &self,
        _file_id: &FileId,
        _file_path: &Path,
        _interval_secs: f64,
    ) -> Result<Vec<RecognitionFrame>> {
        self.record("generate_recognition_frames");
        self.command_delay().await;
        self.recognition_frames
            .lock()
            .clone()
            .ok_or_else(|| anyhow!("recognition failed"))
    }

    async fn generate_subtitle_frames(
        &self,
        _file_id: &FileId,
        _file_path: &Path,
    ) -> Result<Vec<SubtitleFrame>> {
        self.record("generate_subtitle_frames");
        self.command_delay().await;
        self.subtitle_frames
            .lock()
            .clone()
            .ok_or_else(|| anyhow!("subtitle extraction failed"))
    }
}
