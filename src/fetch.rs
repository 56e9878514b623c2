//! # Page Fetcher
//!
//! Async HTTP GET for pages to scrape, with a request timeout, retry with
//! linear backoff, and a process-wide rate limit shared by every request.
//!
//! ## Key Components
//!
//! - `FetcherConfig`: timeouts, retry policy, rate and concurrency limits
//! - `Fetcher`: fetches one URL or a batch of URLs concurrently
//!
//! Network failures, `429` and `5xx` responses are retried. Any other
//! non-success status fails immediately with [`Error::Status`].

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use tracing::{Instrument, debug, debug_span, instrument, warn};

use crate::classifier::parse_url;
use crate::error::{Error, Result};
use crate::pipeline::FetchedPage;

/// Configuration for the fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub retries: u32,

    /// Base backoff in milliseconds, multiplied by the attempt number
    pub retry_delay_ms: u64,

    /// Requests per second across all concurrent fetches
    pub requests_per_second: u32,

    /// Maximum requests in flight in `fetch_all`
    pub concurrency: usize,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 3,
            retry_delay_ms: 1000,
            requests_per_second: 1,
            concurrency: 4,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Builder for FetcherConfig
#[derive(Debug, Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FetcherConfig::default(),
        }
    }

    /// Set the per-request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the number of retries for transient failures
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set the base retry delay in milliseconds
    pub fn retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.config.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Set the global request rate
    pub fn requests_per_second(mut self, requests_per_second: u32) -> Self {
        self.config.requests_per_second = requests_per_second;
        self
    }

    /// Set the number of concurrent requests
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}

impl FetcherConfig {
    /// Create a new builder
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::new()
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Rate-limited HTTP fetcher
#[derive(Clone)]
pub struct Fetcher {
    client: ReqwestClient,
    limiter: Arc<DefaultDirectRateLimiter>,
    config: FetcherConfig,
}

impl Fetcher {
    /// Create a fetcher; fails when the rate is zero or the client cannot be built
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let rate = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            Error::Config("requests_per_second must be greater than 0".to_string())
        })?;
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
            config,
        })
    }

    /// Fetch one URL, retrying transient failures
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        parse_url(url)?;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt <= self.config.retries => {
                    let delay = self.config.retry_delay(attempt);
                    warn!(
                        "Fetch attempt {} for {} failed: {}; retrying in {:?}",
                        attempt, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage> {
        self.limiter
            .until_ready()
            .instrument(debug_span!("limiter"))
            .await;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let html = response.text().await?;
        debug!(bytes = html.len(), status = status.as_u16(), "fetched page");
        Ok(FetchedPage {
            url: url.to_string(),
            html,
            status: status.as_u16(),
        })
    }

    /// Fetch every URL with bounded concurrency.
    ///
    /// Results arrive in completion order, each tagged with the index of its
    /// URL in `urls`.
    pub fn fetch_all<'a>(
        &'a self,
        urls: &'a [String],
    ) -> impl Stream<Item = (usize, Result<FetchedPage>)> + 'a {
        stream::iter(urls.iter().enumerate())
            .map(move |(index, url)| async move { (index, self.fetch(url).await) })
            .buffer_unordered(self.config.concurrency.max(1))
    }
}
