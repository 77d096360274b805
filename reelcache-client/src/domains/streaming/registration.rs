use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use log::{debug, info, warn};
use parking_lot::Mutex;
use reelcache_model::VideoRegistration;

use super::error::RegistrationError;
use crate::infra::{backend::MediaBackend, streaming_server::StreamingServer};

type PendingRegistration =
    Shared<BoxFuture<'static, Result<VideoRegistration, RegistrationError>>>;

/// Session-scoped path to streaming URL memo with in-flight dedup.
///
/// A path is in exactly one of three states: unregistered, registering
/// (an entry in `in_flight`), or registered (an entry in `registered`).
/// Failed registrations go back to unregistered, so the next call retries.
#[derive(Clone)]
pub struct VideoRegistrationCache {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn MediaBackend>,
    server: Arc<dyn StreamingServer>,
    registered: DashMap<PathBuf, VideoRegistration>,
    in_flight: DashMap<PathBuf, PendingRegistration>,
    last_error: Mutex<Option<String>>,
}

impl std::fmt::Debug for VideoRegistrationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoRegistrationCache")
            .field("registered", &self.inner.registered.len())
            .field("in_flight", &self.inner.in_flight.len())
            .finish()
    }
}

impl VideoRegistrationCache {
    pub fn new(
        backend: Arc<dyn MediaBackend>,
        server: Arc<dyn StreamingServer>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                server,
                registered: DashMap::new(),
                in_flight: DashMap::new(),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Streaming URL for `path`, registering it on first use.
    ///
    /// Callers arriving while a registration for the same path is pending
    /// await that registration instead of starting another one.
    pub async fn get_url(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<String, RegistrationError> {
        let path = path.as_ref();
        if let Some(registration) = self.inner.registered.get(path) {
            return Ok(registration.url.clone());
        }

        let pending = match self.inner.in_flight.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => {
                debug!(
                    "registration joined in-flight; path={}",
                    path.display()
                );
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // A registration can settle between the memo lookup above and
                // taking this slot; it memoizes before leaving `in_flight`.
                if let Some(registration) = self.inner.registered.get(path) {
                    return Ok(registration.url.clone());
                }
                let pending = Inner::start(
                    Arc::clone(&self.inner),
                    path.to_path_buf(),
                );
                entry.insert(pending.clone());
                pending
            }
        };

        match pending.await {
            Ok(registration) => Ok(registration.url),
            Err(err) => {
                *self.inner.last_error.lock() = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Forgets one memoized URL, or all of them. Pending registrations are
    /// left alone and still memoize when they settle.
    pub fn clear(&self, path: Option<&Path>) {
        match path {
            Some(path) => {
                self.inner.registered.remove(path);
            }
            None => self.inner.registered.clear(),
        }
    }

    pub async fn is_server_running(&self) -> bool {
        self.inner.server.is_running().await
    }

    pub fn registered_count(&self) -> usize {
        self.inner.registered.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.lock().clone()
    }

    pub fn clear_error(&self) {
        *self.inner.last_error.lock() = None;
    }
}

impl Inner {
    fn start(inner: Arc<Self>, path: PathBuf) -> PendingRegistration {
        async move {
            let result = inner.register(&path).await;
            if let Ok(registration) = &result {
                inner.registered.insert(path.clone(), registration.clone());
            }
            inner.in_flight.remove(&path);
            result
        }
        .boxed()
        .shared()
    }

    async fn register(
        &self,
        path: &Path,
    ) -> Result<VideoRegistration, RegistrationError> {
        match self.backend.register_video(path).await {
            Ok(registration) => {
                info!(
                    "video registered; path={}, id={}",
                    path.display(),
                    registration.id
                );
                Ok(registration)
            }
            Err(native_err) => {
                warn!(
                    "native registration failed, trying streaming server; \
                     path={}, err={native_err:#}",
                    path.display()
                );
                let registration =
                    self.server.register(path).await.inspect_err(|err| {
                        warn!(
                            "streaming server registration failed; \
                             path={}, err={err}",
                            path.display()
                        );
                    })?;
                info!(
                    "video registered via streaming server; path={}, id={}",
                    path.display(),
                    registration.id
                );
                Ok(registration)
            }
        }
    }
}
