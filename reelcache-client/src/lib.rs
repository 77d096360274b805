//! Reelcache client library
//!
//! Glue between editor features and the persistent stores in
//! `reelcache-core`: the preview/frame coordinator, the video streaming
//! registration cache, and the backend seams they talk through.
//!
//! Notes
//! - Services are built once by [`infra::service_registry::ServiceRegistry`]
//!   and shared by `Arc`; nothing here is reachable through statics.
//! - Failures inside the coordinator are reported through `last_error`
//!   and callbacks rather than returned, so batch flows keep going.

pub mod domains;
pub mod infra;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

pub use domains::preview::{PreviewCoordinator, PreviewError, RequestKind};
pub use domains::streaming::{RegistrationError, VideoRegistrationCache};
pub use infra::backend::MediaBackend;
pub use infra::config::ClientConfig;
pub use infra::service_registry::ServiceRegistry;
pub use infra::streaming_server::{HttpStreamingServer, StreamingServer};

/// Initializes `env_logger` for hosts that do not install their own logger.
///
/// Honors `RUST_LOG` when set; otherwise warnings everywhere and debug output
/// for this crate. Safe to call more than once.
pub fn init_logging() {
    let result = if std::env::var("RUST_LOG").is_ok() {
        Builder::from_env(Env::default()).target(Target::Stderr).try_init()
    } else {
        Builder::new()
            .target(Target::Stderr)
            .filter_level(LevelFilter::Warn)
            .filter_module("reelcache_client", LevelFilter::Debug)
            .try_init()
    };

    if let Err(err) = result {
        log::debug!("logger already initialized: {err}");
    }
}
