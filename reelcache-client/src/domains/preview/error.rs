use reelcache_core::CacheError;
use reelcache_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("malformed backend payload: {0}")]
    MalformedPayload(String),
}

impl From<ModelError> for PreviewError {
    fn from(err: ModelError) -> Self {
        PreviewError::MalformedPayload(err.to_string())
    }
}

impl From<anyhow::Error> for PreviewError {
    fn from(err: anyhow::Error) -> Self {
        PreviewError::Backend(format!("{err:#}"))
    }
}
