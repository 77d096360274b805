use std::{
    path::Path,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use reelcache_model::VideoRegistration;

use crate::{
    domains::streaming::RegistrationError,
    infra::streaming_server::StreamingServer,
};

/// Scriptable [`StreamingServer`]. Not running and refusing registrations
/// until configured.
#[derive(Debug)]
pub struct FakeStreamingServer {
    registration: Mutex<Result<VideoRegistration, RegistrationError>>,
    running: AtomicBool,
    register_calls: AtomicUsize,
}

impl Default for FakeStreamingServer {
    fn default() -> Self {
        Self {
            registration: Mutex::new(Err(RegistrationError::Http(
                "connection refused".to_string(),
            ))),
            running: AtomicBool::new(false),
            register_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeStreamingServer {
    pub fn set_registration(
        &self,
        registration: Result<VideoRegistration, RegistrationError>,
    ) {
        *self.registration.lock() = registration;
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamingServer for FakeStreamingServer {
    async fn register(
        &self,
        _path: &Path,
    ) -> Result<VideoRegistration, RegistrationError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.registration.lock().clone()
    }

    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
