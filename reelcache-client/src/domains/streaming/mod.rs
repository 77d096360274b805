//! Video streaming registration
//!
//! Maps absolute source paths to streaming URLs issued by the local
//! streaming server. Registrations are memoized in memory for the session and
//! concurrent requests for one path share a single registration.

pub mod error;
pub mod registration;

pub use error::RegistrationError;
pub use registration::VideoRegistrationCache;
