use std::{fmt, path::Path, sync::Arc};

use log::{debug, info, warn};
use parking_lot::Mutex;
use reelcache_core::{MultiStoreCache, StoreKind};
use reelcache_model::{
    FileId, MediaPreviewData, RecognitionFrame, SubtitleFrame, TimelineFrame,
};
use serde::{Serialize, de::DeserializeOwned};

use super::{error::PreviewError, nearest::nearest_frame};
use crate::infra::backend::MediaBackend;

/// The four kinds of per-file data the coordinator serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Preview,
    TimelineFrames,
    RecognitionFrames,
    SubtitleFrames,
}

impl RequestKind {
    pub const fn store(self) -> StoreKind {
        match self {
            RequestKind::Preview => StoreKind::Preview,
            RequestKind::TimelineFrames => StoreKind::Frames,
            RequestKind::RecognitionFrames => StoreKind::Recognition,
            RequestKind::SubtitleFrames => StoreKind::Subtitle,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestKind::Preview => "preview",
            RequestKind::TimelineFrames => "timeline frames",
            RequestKind::RecognitionFrames => "recognition frames",
            RequestKind::SubtitleFrames => "subtitle frames",
        })
    }
}

/// Invoked after a successful generate with what was produced and for whom.
pub type CompletionCallback = Arc<dyn Fn(RequestKind, &FileId) + Send + Sync>;
/// Invoked with the same message stored in `last_error`.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Cache-first front for preview and frame data.
///
/// Lookups try the local store, then the backend's aggregate preview record,
/// writing any non-empty result back. Generation always goes to the backend
/// and writes through. Failures never propagate: they are logged, kept in
/// `last_error`, passed to the error callback, and the call returns an empty
/// value so batch flows carry on.
///
/// Concurrent requests for the same file are not coalesced; each one reaches
/// the backend on a miss.
pub struct PreviewCoordinator {
    cache: Arc<MultiStoreCache>,
    backend: Arc<dyn MediaBackend>,
    on_complete: Option<CompletionCallback>,
    on_error: Option<ErrorCallback>,
    last_error: Mutex<Option<String>>,
}

impl fmt::Debug for PreviewCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewCoordinator")
            .field("cache_root", &self.cache.root())
            .field("has_on_complete", &self.on_complete.is_some())
            .field("has_on_error", &self.on_error.is_some())
            .field("last_error", &*self.last_error.lock())
            .finish()
    }
}

impl PreviewCoordinator {
    pub fn new(
        cache: Arc<MultiStoreCache>,
        backend: Arc<dyn MediaBackend>,
    ) -> Self {
        Self {
            cache,
            backend,
            on_complete: None,
            on_error: None,
            last_error: Mutex::new(None),
        }
    }

    pub fn with_on_complete(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    pub fn with_on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    pub fn cache(&self) -> &Arc<MultiStoreCache> {
        &self.cache
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn clear_error(&self) {
        *self.last_error.lock() = None;
    }

    // Lookups

    /// Encoded thumbnail for `file_id`.
    pub async fn get_preview(&self, file_id: &FileId) -> Option<String> {
        let result = self
            .cached_or_backend(RequestKind::Preview, file_id, |data| {
                data.thumbnail_data().map(str::to_string)
            })
            .await;
        self.settle_lookup(RequestKind::Preview, file_id, result)
    }

    pub async fn get_timeline_frames(
        &self,
        file_id: &FileId,
    ) -> Option<Vec<TimelineFrame>> {
        let result = self
            .cached_or_backend(RequestKind::TimelineFrames, file_id, |data| {
                non_empty(data.timeline_frames)
            })
            .await;
        self.settle_lookup(RequestKind::TimelineFrames, file_id, result)
    }

    pub async fn get_recognition_frames(
        &self,
        file_id: &FileId,
    ) -> Option<Vec<RecognitionFrame>> {
        let result = self
            .cached_or_backend(
                RequestKind::RecognitionFrames,
                file_id,
                |data| non_empty(data.recognition_frames),
            )
            .await;
        self.settle_lookup(RequestKind::RecognitionFrames, file_id, result)
    }

    pub async fn get_subtitle_frames(
        &self,
        file_id: &FileId,
    ) -> Option<Vec<SubtitleFrame>> {
        let result = self
            .cached_or_backend(RequestKind::SubtitleFrames, file_id, |data| {
                non_empty(data.subtitle_frames)
            })
            .await;
        self.settle_lookup(RequestKind::SubtitleFrames, file_id, result)
    }

    /// Cached frame nearest to `timestamp`, or a frame extracted on demand at
    /// exactly `timestamp` when nothing is cached for the file.
    ///
    /// On-demand frames are returned but not cached: a single frame would
    /// shadow the full sequence for every later lookup.
    pub async fn frame_at_timestamp(
        &self,
        file_id: &FileId,
        source_path: &Path,
        timestamp: f64,
    ) -> Option<TimelineFrame> {
        let cached = match self
            .cache
            .read::<Vec<TimelineFrame>>(StoreKind::Frames, file_id.as_str())
            .await
        {
            Ok(frames) => frames,
            Err(err) => {
                self.record_error(format!(
                    "frame lookup failed for {file_id}: {err}"
                ));
                None
            }
        };

        if let Some(frames) = cached
            && let Some(frame) = nearest_frame(&frames, timestamp)
        {
            return Some(frame.clone());
        }

        debug!(
            "no cached frames, extracting; file_id={file_id}, t={timestamp}"
        );
        match self
            .backend
            .extract_frame_at(file_id, source_path, timestamp)
            .await
        {
            Ok(frame) => Some(frame),
            Err(err) => {
                self.record_error(format!(
                    "frame extraction failed for {file_id}: {err:#}"
                ));
                None
            }
        }
    }

    // Generation

    pub async fn generate_preview(
        &self,
        file_id: &FileId,
        source_path: &Path,
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Option<String> {
        let result = async {
            let thumbnail = self
                .backend
                .generate_media_thumbnail(
                    file_id,
                    source_path,
                    width,
                    height,
                    timestamp,
                )
                .await?;
            thumbnail.validate()?;
            Ok::<_, PreviewError>(thumbnail.base64_data)
        }
        .await;
        self.settle_generate(RequestKind::Preview, file_id, result)
            .await
    }

    /// Extracts `count` frames, caches them, and pushes them to the backend's
    /// own store. The backend push is best effort.
    pub async fn generate_timeline_frames(
        &self,
        file_id: &FileId,
        source_path: &Path,
        count: u32,
    ) -> Option<Vec<TimelineFrame>> {
        let result = self
            .backend
            .extract_timeline_frames(file_id, source_path, count)
            .await
            .map_err(PreviewError::from);

        if let Ok(frames) = &result
            && let Err(err) =
                self.backend.save_timeline_frames(file_id, frames).await
        {
            warn!(
                "saving timeline frames to backend failed; \
                 file_id={file_id}, err={err:#}"
            );
        }

        self.settle_generate(RequestKind::TimelineFrames, file_id, result)
            .await
    }

    pub async fn generate_recognition_frames(
        &self,
        file_id: &FileId,
        source_path: &Path,
        interval_secs: f64,
    ) -> Option<Vec<RecognitionFrame>> {
        let result = self
            .backend
            .generate_recognition_frames(file_id, source_path, interval_secs)
            .await
            .map_err(PreviewError::from);
        self.settle_generate(RequestKind::RecognitionFrames, file_id, result)
            .await
    }

    pub async fn generate_subtitle_frames(
        &self,
        file_id: &FileId,
        source_path: &Path,
    ) -> Option<Vec<SubtitleFrame>> {
        let result = self
            .backend
            .generate_subtitle_frames(file_id, source_path)
            .await
            .map_err(PreviewError::from);
        self.settle_generate(RequestKind::SubtitleFrames, file_id, result)
            .await
    }

    // Maintenance

    /// Clears the backend's preview data for `file_id`, then the file's
    /// records in every local store. Local records are kept when the backend
    /// refuses.
    pub async fn clear(&self, file_id: &FileId) -> bool {
        let result = async {
            self.backend.clear_media_preview_data(file_id).await?;
            let removed = self.cache.delete_everywhere(file_id.as_str()).await?;
            Ok::<_, PreviewError>(removed)
        }
        .await;

        match result {
            Ok(removed) => {
                info!(
                    "preview data cleared; file_id={file_id}, \
                     local_records={removed}"
                );
                true
            }
            Err(err) => {
                self.record_error(format!(
                    "clearing preview data failed for {file_id}: {err}"
                ));
                false
            }
        }
    }

    pub async fn files_with_previews(&self) -> Vec<FileId> {
        match self.backend.get_files_with_previews().await {
            Ok(files) => files,
            Err(err) => {
                self.record_error(format!(
                    "listing files with previews failed: {err:#}"
                ));
                Vec::new()
            }
        }
    }

    /// Asks the backend to persist all preview data to `path`.
    pub async fn export_previews(&self, path: &Path) -> bool {
        match self.backend.save_preview_data(path).await {
            Ok(()) => {
                info!("preview data exported; path={}", path.display());
                true
            }
            Err(err) => {
                self.record_error(format!(
                    "exporting preview data to {} failed: {err:#}",
                    path.display()
                ));
                false
            }
        }
    }

    /// Asks the backend to load preview data previously exported to `path`.
    pub async fn import_previews(&self, path: &Path) -> bool {
        match self.backend.load_preview_data(path).await {
            Ok(()) => {
                info!("preview data imported; path={}", path.display());
                true
            }
            Err(err) => {
                self.record_error(format!(
                    "importing preview data from {} failed: {err:#}",
                    path.display()
                ));
                false
            }
        }
    }

    async fn cached_or_backend<T, F>(
        &self,
        kind: RequestKind,
        file_id: &FileId,
        extract: F,
    ) -> Result<Option<T>, PreviewError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce(MediaPreviewData) -> Option<T> + Send,
    {
        match self.cache.read::<T>(kind.store(), file_id.as_str()).await {
            Ok(Some(hit)) => {
                debug!("{kind} cache hit; file_id={file_id}");
                return Ok(Some(hit));
            }
            Ok(None) => {}
            // The backend may still have the data.
            Err(err) => self.record_error(format!(
                "{kind} cache read failed for {file_id}: {err}"
            )),
        }

        let Some(data) = self.backend.get_media_preview_data(file_id).await?
        else {
            debug!("{kind} unavailable; file_id={file_id}");
            return Ok(None);
        };
        let Some(value) = extract(data) else {
            debug!("{kind} not in backend record; file_id={file_id}");
            return Ok(None);
        };

        self.write_through(kind, file_id, &value).await;
        Ok(Some(value))
    }

    fn settle_lookup<T>(
        &self,
        kind: RequestKind,
        file_id: &FileId,
        result: Result<Option<T>, PreviewError>,
    ) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(err) => {
                self.record_error(format!(
                    "{kind} lookup failed for {file_id}: {err}"
                ));
                None
            }
        }
    }

    async fn settle_generate<T: Serialize + Sync>(
        &self,
        kind: RequestKind,
        file_id: &FileId,
        result: Result<T, PreviewError>,
    ) -> Option<T> {
        match result {
            Ok(value) => {
                self.write_through(kind, file_id, &value).await;
                debug!("{kind} generated; file_id={file_id}");
                if let Some(callback) = &self.on_complete {
                    callback(kind, file_id);
                }
                Some(value)
            }
            Err(err) => {
                self.record_error(format!(
                    "{kind} generation failed for {file_id}: {err}"
                ));
                None
            }
        }
    }

    /// A failed write keeps the value usable for the caller; only the cache
    /// misses out.
    async fn write_through<T: Serialize + Sync>(
        &self,
        kind: RequestKind,
        file_id: &FileId,
        value: &T,
    ) {
        if let Err(err) =
            self.cache.write(kind.store(), file_id.as_str(), value).await
        {
            self.record_error(format!(
                "{kind} cache write failed for {file_id}: {err}"
            ));
        }
    }

    fn record_error(&self, message: String) {
        warn!("{message}");
        if let Some(callback) = &self.on_error {
            callback(&message);
        }
        *self.last_error.lock() = Some(message);
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
