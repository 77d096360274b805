use thiserror::Error;

/// Why a path could not be turned into a streaming URL.
///
/// `Clone` so one in-flight result can be handed to every waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("streaming server request failed: {0}")]
    Http(String),

    #[error("Failed to register video: {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("invalid registration response: {0}")]
    Decode(String),
}
