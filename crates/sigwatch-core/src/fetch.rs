//! Remote retrieval: version index, checksum manifests, detached
//! signatures and artifacts.
//!
//! Manifests and signatures come from one origin, artifacts from another.
//! Every request goes through the same timeout and retry policy; nothing
//! here writes to disk.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response};
use sigwatch_schema::{VersionId, VersionIndex};

use crate::config::{Config, RetryConfig};
use crate::error::{Error, Result};
use crate::paths::{join_url, signature_file_name};

/// Capped exponential backoff for transient transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, or `None` to give up.
    ///
    /// `attempt` is 1-based (1 = first attempt).
    pub fn decide(&self, attempt: u32, err: &Error) -> Option<Duration> {
        if attempt >= self.max_attempts || !err.is_retryable() {
            return None;
        }
        let exp = 1u32 << attempt.saturating_sub(1).min(8);
        Some(self.base_delay.saturating_mul(exp).min(self.max_delay))
    }
}

/// HTTP client bound to the configured origins.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    index_url: String,
    manifest_base_url: String,
    artifact_base_url: String,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Build a fetcher with the configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Use an existing client (shared connection pool, tests).
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            index_url: config.index_url.clone(),
            manifest_base_url: config.manifest_base_url.clone(),
            artifact_base_url: config.artifact_base_url.clone(),
            retry: RetryPolicy::from(&config.retry),
        }
    }

    /// URL of the checksum manifest of `version`.
    pub fn manifest_url(&self, version: &VersionId) -> String {
        join_url(&self.manifest_base_url, version.as_str())
    }

    /// URL of the detached signature of `version`.
    pub fn signature_url(&self, version: &VersionId) -> String {
        join_url(&self.manifest_base_url, &signature_file_name(version.as_str()))
    }

    /// Download URL of an artifact.
    pub fn artifact_url(&self, filename: &str) -> String {
        join_url(&self.artifact_base_url, filename)
    }

    /// Fetch the list of published identifiers.
    ///
    /// # Errors
    ///
    /// [`Error::Network`]/[`Error::HttpStatus`] on transport failure,
    /// [`Error::Format`] if the body is not a JSON array of strings.
    pub async fn fetch_index(&self) -> Result<VersionIndex> {
        let url = self.index_url.as_str();
        let body = self.with_retry(url, || self.get_bytes_once(url)).await?;
        let entries: Vec<String> = serde_json::from_slice(&body).map_err(|e| {
            Error::Format(format!("index at {url} is not a JSON list of strings: {e}"))
        })?;
        tracing::debug!(entries = entries.len(), "fetched version index");
        Ok(VersionIndex::new(entries))
    }

    /// Fetch the checksum manifest text of a version.
    ///
    /// # Errors
    ///
    /// Transport errors as for [`Fetcher::fetch_index`]; [`Error::Format`] if
    /// the body is not UTF-8.
    pub async fn fetch_manifest(&self, version: &VersionId) -> Result<String> {
        let url = self.manifest_url(version);
        let body = self.with_retry(&url, || self.get_bytes_once(&url)).await?;
        String::from_utf8(body.to_vec())
            .map_err(|_| Error::Format(format!("manifest at {url} is not UTF-8 text")))
    }

    /// Fetch the raw detached signature of a version.
    ///
    /// # Errors
    ///
    /// Any non-success status is an error; there is no fallback.
    pub async fn fetch_signature(&self, version: &VersionId) -> Result<Vec<u8>> {
        let url = self.signature_url(version);
        let body = self.with_retry(&url, || self.get_bytes_once(&url)).await?;
        Ok(body.to_vec())
    }

    /// Start downloading an artifact from the artifact origin.
    ///
    /// Only the request is retried; the caller consumes the body stream.
    ///
    /// # Errors
    ///
    /// Transport errors as for [`Fetcher::fetch_index`].
    pub async fn artifact_response(&self, filename: &str) -> Result<Response> {
        let url = self.artifact_url(filename);
        self.with_retry(&url, || self.send_once(&url)).await
    }

    async fn with_retry<T, F, Fut>(&self, url: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => match self.retry.decide(attempt, &err) {
                    Some(delay) => {
                        tracing::warn!(
                            url,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "transient failure, retrying: {err}"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }

    async fn send_once(&self, url: &str) -> Result<Response> {
        tracing::debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| Error::Network {
                url: url.to_string(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }

    async fn get_bytes_once(&self, url: &str) -> Result<bytes::Bytes> {
        self.send_once(url)
            .await?
            .bytes()
            .await
            .map_err(|source| Error::Network {
                url: url.to_string(),
                source,
            })
    }
}
