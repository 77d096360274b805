pub mod backend;
pub mod config;
pub mod service_registry;
pub mod streaming_server;
pub mod testing;
