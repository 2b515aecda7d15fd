use crate::config::ScraperConfig;
use crate::errors::FetchError;
use crate::scraper::PageFetcher;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};
use url::Url;

pub struct HttpClient {
    inner: reqwest::Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            max_retries: config.max_retries,
        })
    }

    async fn get_once(&self, url: &Url) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        debug!("{} -> {}", url, status);

        resp.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    /// Fetch a URL as text, retrying transient failures with backoff.
    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        // 500ms, 1s, 2s, ... capped at 10s
        let backoff = ExponentialBackoff::from_millis(2)
            .factor(250)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.max_retries as usize);

        RetryIf::spawn(
            backoff,
            || self.get_once(url),
            |e: &FetchError| {
                let retry = e.is_transient();
                if retry {
                    warn!("Retrying after {}", e);
                }
                retry
            },
        )
        .await
    }
}
