//! sigwatch - release signature monitor
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Periodically snapshots a publisher's version index, verifies the detached
//! signature of every checksum manifest against a pinned public key, and
//! checks downloadable artifacts against the signed hashes.
//!
//! # Snapshot Layout
//!
//! ```text
//! <root>/
//! ├── versions-YYYY-MM-DD.json   # Index as fetched that day
//! ├── <version>.txt              # Checksum manifest
//! ├── <version>.sig              # Detached signature
//! └── checked/<version>/         # <artifact>.checked markers
//! ```

pub mod cmd;
pub mod exit;
pub mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sigwatch_core::Config;
use sigwatch_schema::SignatureScheme;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sigwatch")]
#[command(author, version, about = "sigwatch - release signature monitor")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "SIGWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Snapshot directory
    #[arg(long, global = true, env = "SIGWATCH_HOME")]
    pub root: Option<PathBuf>,

    /// Publisher public key
    #[arg(long, global = true, env = "SIGWATCH_TRUST_ANCHOR")]
    pub trust_anchor: Option<PathBuf>,

    /// Signature scheme of the trust anchor (ecdsa-p256-sha256, ed25519)
    #[arg(long, global = true)]
    pub scheme: Option<SignatureScheme>,

    /// URL of the version index
    #[arg(long, global = true, env = "SIGWATCH_INDEX_URL")]
    pub index_url: Option<String>,

    /// Base URL of manifests and signatures
    #[arg(long, global = true, env = "SIGWATCH_MANIFEST_URL")]
    pub manifest_url: Option<String>,

    /// Base URL of artifact downloads
    #[arg(long, global = true, env = "SIGWATCH_ARTIFACT_URL")]
    pub artifact_url: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Snapshot the index and verify every listed version
    Run {
        /// Process at most this many versions
        #[arg(long)]
        limit: Option<usize>,
        /// Walk the index from its last entry
        #[arg(long)]
        newest_first: bool,
        /// Verify signatures only, skip artifact downloads
        #[arg(long)]
        no_artifacts: bool,
    },
    /// Verify a local manifest against its detached signature
    Verify {
        /// Checksum manifest
        manifest: PathBuf,
        /// Detached signature of the manifest
        signature: PathBuf,
    },
    /// Print SHA-256 and SHA-512 of local files
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Build the effective configuration: file (or defaults), then flags and
    /// environment on top.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(root) = &self.root {
            config.root.clone_from(root);
        }
        if let Some(anchor) = &self.trust_anchor {
            config.trust_anchor.clone_from(anchor);
        }
        if let Some(scheme) = self.scheme {
            config.scheme = scheme;
        }
        if let Some(url) = &self.index_url {
            config.index_url.clone_from(url);
        }
        if let Some(url) = &self.manifest_url {
            config.manifest_base_url.clone_from(url);
        }
        if let Some(url) = &self.artifact_url {
            config.artifact_base_url.clone_from(url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "sigwatch=debug"
        } else {
            "sigwatch=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sigwatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--root",
            "/tmp/snapshots",
            "--scheme",
            "ed25519",
            "--index-url",
            "http://localhost:1/versions.json",
            "config",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.root, PathBuf::from("/tmp/snapshots"));
        assert_eq!(config.scheme, SignatureScheme::Ed25519);
        assert_eq!(config.index_url, "http://localhost:1/versions.json");
    }

    #[test]
    fn run_flags_parse() {
        let cli = parse(&["run", "--limit", "3", "--newest-first", "--no-artifacts"]);
        match cli.command {
            Commands::Run {
                limit,
                newest_first,
                no_artifacts,
            } => {
                assert_eq!(limit, Some(3));
                assert!(newest_first);
                assert!(no_artifacts);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let res = Cli::try_parse_from(["sigwatch", "--scheme", "rsa", "config"]);
        assert!(res.is_err());
    }

    #[test]
    fn invalid_url_fails_validation() {
        let cli = parse(&["--index-url", "ftp://example.com/versions.json", "config"]);
        assert!(cli.load_config().is_err());
    }
}
