//! Run configuration.
//!
//! Everything a component needs (snapshot root, trust anchor, remote
//! origins, timeouts) is carried here and passed in explicitly.

use serde::{Deserialize, Serialize};
use sigwatch_schema::{IndexOrder, SignatureScheme};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Published list of versions.
pub const DEFAULT_INDEX_URL: &str =
    "https://resources.live.ledger.app/public_resources/signatures/versions.json";
/// Where `<version>` manifests and `<version>.sig` signatures live.
pub const DEFAULT_MANIFEST_BASE_URL: &str =
    "https://resources.live.ledger.app/public_resources/signatures";
/// Artifact download origin.
pub const DEFAULT_ARTIFACT_BASE_URL: &str = "https://download.live.ledger.com";
/// Publisher key file, relative to the working directory.
pub const DEFAULT_TRUST_ANCHOR: &str = "ledgerlive.pem";

/// Retry parameters for transient network failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Settings for one monitor run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot root; every persisted file lives under it.
    pub root: PathBuf,
    /// Public key file of the publisher.
    pub trust_anchor: PathBuf,
    /// Scheme the trust anchor signs with.
    pub scheme: SignatureScheme,
    /// JSON list of published identifiers.
    pub index_url: String,
    /// Base URL of checksum manifests and their `.sig` files.
    pub manifest_base_url: String,
    /// Base URL artifacts are downloaded from. A different origin than the
    /// manifests.
    pub artifact_base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Direction the index is walked in.
    pub order: IndexOrder,
    /// Download and hash every artifact of a verified manifest.
    pub verify_artifacts: bool,
    /// Extra index entries to skip.
    pub ignore: Vec<String>,
    /// Retry behaviour for transient network failures.
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: crate::paths::default_root(),
            trust_anchor: PathBuf::from(DEFAULT_TRUST_ANCHOR),
            scheme: SignatureScheme::default(),
            index_url: DEFAULT_INDEX_URL.to_string(),
            manifest_base_url: DEFAULT_MANIFEST_BASE_URL.to_string(),
            artifact_base_url: DEFAULT_ARTIFACT_BASE_URL.to_string(),
            timeout_secs: 30,
            order: IndexOrder::Forward,
            verify_artifacts: true,
            ignore: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load a TOML config file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let cfg: Self = toml::from_str(&data)
            .map_err(|e| Error::Config(format!("invalid config {}: {e}", path.display())))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject settings no run could succeed with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("index_url", &self.index_url),
            ("manifest_base_url", &self.manifest_base_url),
            ("artifact_base_url", &self.artifact_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.root.as_os_str().is_empty() {
            return Err(Error::Config("root must not be empty".into()));
        }
        Ok(())
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
