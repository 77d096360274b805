// HTTP fallback for video registration against the local streaming server

use std::{path::Path, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reelcache_model::VideoRegistration;
use reqwest::Client;
use url::Url;

use crate::domains::streaming::RegistrationError;

pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(1);

#[async_trait]
pub trait StreamingServer: Send + Sync {
    /// `GET /register?path=<encoded>`; a non-2xx answer is a failure.
    async fn register(
        &self,
        path: &Path,
    ) -> Result<VideoRegistration, RegistrationError>;

    /// `HEAD /health`. Errors and timeouts read as not running.
    async fn is_running(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct HttpStreamingServer {
    client: Client,
    base_url: String,
    health_timeout: Duration,
}

impl HttpStreamingServer {
    /// Accepts `host:port` as well as full URLs; a missing scheme becomes
    /// `http://` and a trailing slash is dropped.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let with_scheme = if trimmed.starts_with("http://")
            || trimmed.starts_with("https://")
        {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
        Url::parse(&with_scheme).with_context(|| {
            format!("invalid streaming server url: {base_url}")
        })?;

        let client = Client::builder()
            .build()
            .context("failed to build streaming server http client")?;

        Ok(Self {
            client,
            base_url: with_scheme,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        })
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn register_url(&self, path: &Path) -> String {
        format!(
            "{}/register?path={}",
            self.base_url,
            urlencoding::encode(&path.to_string_lossy())
        )
    }
}

#[async_trait]
impl StreamingServer for HttpStreamingServer {
    async fn register(
        &self,
        path: &Path,
    ) -> Result<VideoRegistration, RegistrationError> {
        let url = self.register_url(path);
        debug!("streaming server register; url={url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RegistrationError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistrationError::Status {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            });
        }

        response
            .json::<VideoRegistration>()
            .await
            .map_err(|e| RegistrationError::Decode(e.to_string()))
    }

    async fn is_running(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self
            .client
            .head(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!("streaming server health probe failed: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let server = HttpStreamingServer::new(" localhost:8765/ ").unwrap();
        assert_eq!(server.base_url(), "http://localhost:8765");

        let server = HttpStreamingServer::new("https://media.local").unwrap();
        assert_eq!(server.base_url(), "https://media.local");
    }

    #[test]
    fn register_url_encodes_the_path() {
        let server = HttpStreamingServer::new("http://127.0.0.1:1").unwrap();
        let url = server.register_url(Path::new("/videos/my clip&1.mp4"));
        assert_eq!(
            url,
            "http://127.0.0.1:1/register?path=%2Fvideos%2Fmy%20clip%261.mp4"
        );
    }
}
