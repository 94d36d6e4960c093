//! HTTP client for FindChips requests using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::findchips::snapshot::SnapshotStore;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Failure to retrieve a search page. Fetches are attempted once and never retried here.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("fetching {part_number} did not finish within {limit:?}")]
    Deadline { part_number: String, limit: Duration },

    #[error("request to {url} failed with status: {status}")]
    Status { url: String, status: u16 },

    #[error("failed to send request to {url}")]
    Transport {
        url: String,
        #[source]
        source: wreq::Error,
    },

    #[error("failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: wreq::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Returns true if the request was abandoned because it took too long.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. } | FetchError::Deadline { .. })
    }
}

/// Trait for fetching search pages - enables mocking for tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the search result page for a part number and returns its HTML.
    async fn fetch(&self, part_number: &str) -> Result<String, FetchError>;
}

/// FindChips HTTP client with browser impersonation.
pub struct FindChipsClient {
    client: Client,
    search_url: String,
    delay_ms: u64,
    delay_jitter_ms: u64,
    snapshots: Option<SnapshotStore>,
}

impl FindChipsClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| FetchError::Client(format!("invalid proxy '{}': {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| FetchError::Client(e.to_string()))?;

        let snapshots = config.save_html.then(|| SnapshotStore::new(&config.snapshot_dir));

        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            snapshots,
        })
    }

    /// Builds the search URL; the part number becomes a single encoded path segment.
    pub fn search_url(&self, part_number: &str) -> String {
        format!("{}{}", self.search_url, urlencoding::encode(part_number.trim()))
    }

    /// Performs a GET request with browser emulation headers.
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.delay().await;

        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    FetchError::Timeout { url: url.to_string() }
                } else {
                    FetchError::Transport { url: url.to_string(), source }
                }
            })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 429 || status == 503 {
            warn!("Rate limited ({}). Consider using a proxy or waiting before resubmitting.", status);
        }

        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        response.text().await.map_err(|source| {
            if source.is_timeout() {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Body { url: url.to_string(), source }
            }
        })
    }

    /// Adds a random delay before each request when configured.
    async fn delay(&self) {
        if self.delay_ms == 0 && self.delay_jitter_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl PageFetcher for FindChipsClient {
    async fn fetch(&self, part_number: &str) -> Result<String, FetchError> {
        let url = self.search_url(part_number);
        info!("Attempting to fetch HTML for {} from {}", part_number, url);

        let html = self.get(&url).await?;

        if let Some(snapshots) = &self.snapshots {
            snapshots.save(part_number, &html);
        }

        Ok(html)
    }
}
