//! In-memory fakes for the backend seams
//!
//! Used by unit tests here and by the integration tests under `tests/`.
//! Every fake records which commands it served so tests can assert on call
//! counts.

pub mod backend;
pub mod streaming;

pub use backend::FakeBackend;
pub use streaming::FakeStreamingServer;
