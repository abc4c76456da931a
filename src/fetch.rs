use std::time::Duration;

use reqwest::{
    header::{CONTENT_TYPE, LOCATION},
    redirect::Policy,
    Client,
};

use crate::config::ImageConfig;
use crate::error::{FixtralError, Result};

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Downloads source images. The timeout bounds the whole exchange, body included.
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
    timeout: Duration,
    restricted: bool,
}

impl ImageFetcher {
    /// Follows redirects anywhere, up to the reqwest default of ten hops.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::build(timeout, Policy::default(), false)
    }

    /// Only follows redirects whose target passes the allow-list. A refused
    /// hop fails the fetch with [`FixtralError::HostNotAllowed`].
    pub fn with_allowed_hosts(timeout: Duration, images: ImageConfig) -> Result<Self> {
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if images.is_allowed_url(attempt.url().as_str()) {
                attempt.follow()
            } else {
                attempt.stop()
            }
        });
        Self::build(timeout, policy, true)
    }

    fn build(timeout: Duration, policy: Policy, restricted: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .redirect(policy)
            .build()
            .map_err(|e| FixtralError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            restricted,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.describe(e))?;

        let status = response.status();
        // a stopped redirect comes back as the 3xx response itself
        if self.restricted && status.is_redirection() {
            if let Some(target) = response.headers().get(LOCATION) {
                let target = target.to_str().unwrap_or("<non-ascii location>");
                log::warn!("Refused redirect from {} to {}", url, target);
                return Err(FixtralError::HostNotAllowed(target.to_string()));
            }
        }
        if !status.is_success() {
            return Err(FixtralError::FetchError(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let bytes = response.bytes().await.map_err(|e| self.describe(e))?;

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    fn describe(&self, err: reqwest::Error) -> FixtralError {
        if err.is_timeout() {
            FixtralError::FetchError(format!(
                "timed out after {}s",
                self.timeout.as_secs_f32()
            ))
        } else {
            FixtralError::FetchError(err.to_string())
        }
    }
}
