//! Service registry: the one place the cache services are built
//!
//! The application owns a single `ServiceRegistry` for the life of the
//! process and hands `Arc`s of the services it holds to whoever needs them.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use log::{info, warn};
use reelcache_core::MultiStoreCache;
use tokio::task::JoinHandle;

use super::{
    backend::MediaBackend,
    config::ClientConfig,
    streaming_server::{HttpStreamingServer, StreamingServer},
};
use crate::domains::{
    preview::PreviewCoordinator, streaming::VideoRegistrationCache,
};

#[derive(Clone)]
pub struct ServiceRegistry {
    pub cache: Arc<MultiStoreCache>,
    pub previews: Arc<PreviewCoordinator>,
    pub streaming: Arc<VideoRegistrationCache>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("cache_root", &self.cache.root())
            .field("previews", &"<PreviewCoordinator>")
            .field("streaming", &self.streaming)
            .finish()
    }
}

impl ServiceRegistry {
    /// Opens the cache at the configured root and talks to the configured
    /// streaming server over HTTP.
    pub fn from_config(
        config: &ClientConfig,
        backend: Arc<dyn MediaBackend>,
    ) -> anyhow::Result<Self> {
        let root = config.cache_root()?;
        let cache = MultiStoreCache::open(&root, config.cache_limits())
            .with_context(|| {
                format!("failed to open cache at {}", root.display())
            })?;
        let server = HttpStreamingServer::new(&config.streaming_server_url)?
            .with_health_timeout(config.health_timeout);

        info!(
            "services ready; cache_root={}, streaming_server={}",
            root.display(),
            server.base_url()
        );
        Ok(Self::new(Arc::new(cache), backend, Arc::new(server)))
    }

    pub fn new(
        cache: Arc<MultiStoreCache>,
        backend: Arc<dyn MediaBackend>,
        server: Arc<dyn StreamingServer>,
    ) -> Self {
        let previews = Arc::new(PreviewCoordinator::new(
            Arc::clone(&cache),
            Arc::clone(&backend),
        ));
        let streaming = Arc::new(VideoRegistrationCache::new(backend, server));
        Self {
            cache,
            previews,
            streaming,
        }
    }

    /// Replaces the coordinator, e.g. to attach callbacks built by the UI.
    pub fn with_previews(mut self, previews: PreviewCoordinator) -> Self {
        self.previews = Arc::new(previews);
        self
    }

    /// Sweeps expired records every `interval` until the handle is aborted.
    /// The first sweep runs immediately.
    pub fn spawn_expiry_sweep(&self, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(
                tokio::time::MissedTickBehavior::Delay,
            );
            loop {
                ticker.tick().await;
                match cache.cleanup_expired().await {
                    Ok(report) if report.removed > 0 => info!(
                        "expiry sweep removed {} records ({} bytes)",
                        report.removed, report.freed_bytes
                    ),
                    Ok(_) => {}
                    Err(err) => warn!("expiry sweep failed: {err}"),
                }
            }
        })
    }
}
