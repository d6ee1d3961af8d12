//! HTTP feed fetcher
//!
//! This module handles all feed requests, including:
//! - Building the shared HTTP client with the configured user agent
//! - Bounding each request attempt by the per-source timeout
//! - Retrying timeouts, connect errors and 5xx responses with backoff
//! - Classifying failures into network, parse and timeout outcomes

use crate::config::FetchConfig;
use crate::fetch::parser::parse_feed;
use crate::fetch::types::{FetchError, FetchOutcome};
use crate::policy::{RetryPolicy, RunDeadline};
use crate::sources::SourceDescriptor;
use async_trait::async_trait;
use backoff::backoff::Backoff;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Fetches one source and reports the result as data
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches and parses one source; failures are returned inside the outcome
    ///
    /// No retry is started once `deadline` cannot cover its backoff delay.
    async fn fetch(&self, source: &SourceDescriptor, deadline: RunDeadline) -> FetchOutcome;
}

/// Builds an HTTP client for feed requests
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use feed_digest::config::FetchConfig;
/// use feed_digest::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(config.timeout().min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Feed fetcher over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
    timeout: Duration,
    max_items_per_source: usize,
    retry: RetryPolicy,
}

impl HttpFeedFetcher {
    pub fn new(
        client: Client,
        timeout: Duration,
        max_items_per_source: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            timeout,
            max_items_per_source,
            retry,
        }
    }

    /// Builds a fetcher and its client from the `[fetch]` section
    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            config.timeout(),
            config.max_items_per_source,
            config.retry_policy(),
        ))
    }

    async fn fetch_document(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e, self.timeout))?;
        Ok(body.to_vec())
    }

    /// One request bounded by the per-source timeout
    async fn attempt(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match tokio::time::timeout(self.timeout, self.fetch_document(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }),
        }
    }

    /// Requests the document, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(body)` - A 2xx response body
    /// * `Err(FetchError)` - The last failure once retries are spent, the
    ///   failure is permanent, or the deadline leaves no room for a retry
    async fn fetch_with_retry(
        &self,
        source: &SourceDescriptor,
        deadline: RunDeadline,
    ) -> Result<Vec<u8>, FetchError> {
        let mut backoff = self.retry.backoff();
        let mut attempt = 1;

        loop {
            let error = match self.attempt(&source.url).await {
                Ok(body) => return Ok(body),
                Err(error) => error,
            };

            if !error.is_transient() || attempt >= self.retry.max_attempts() {
                return Err(error);
            }

            let delay = backoff.next_backoff().unwrap_or(self.retry.max_delay);
            if delay >= deadline.remaining() {
                tracing::debug!(
                    "Not retrying {}: run deadline leaves no room",
                    source.display_name
                );
                return Err(error);
            }

            tracing::debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempt,
                source.display_name,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFeedFetcher {
    async fn fetch(&self, source: &SourceDescriptor, deadline: RunDeadline) -> FetchOutcome {
        let started = Instant::now();

        let outcome = match self.fetch_with_retry(source, deadline).await {
            Ok(body) => match parse_feed(&body, source, self.max_items_per_source) {
                Ok(items) => FetchOutcome::success(items),
                Err(message) => FetchOutcome::failed(FetchError::Parse {
                    url: source.url.clone(),
                    message,
                }),
            },
            Err(error) => FetchOutcome::failed(error),
        };

        match &outcome.failure {
            None => tracing::debug!(
                "Fetched {} items from {} in {:?}",
                outcome.items.len(),
                source.display_name,
                started.elapsed()
            ),
            Some(error) => tracing::warn!("Source {} failed: {}", source.display_name, error),
        }

        outcome
    }
}

/// Maps a reqwest error onto the fetch failure taxonomy
fn classify_error(url: &str, error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            after: timeout,
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            status: None,
            message: "connection failed".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}
