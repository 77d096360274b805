pub mod preview;
pub mod streaming;
