pub mod cache;
pub mod clock;
