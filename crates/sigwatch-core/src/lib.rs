//! sigwatch core: fetch release attestations, verify them, keep the evidence.
//!
//! The pipeline checks that a detached signature over a checksum manifest
//! verifies against a pre-provisioned public key, then that every artifact
//! the manifest lists hashes to the listed value. Index, manifests and
//! signatures are kept as write-once snapshots for later audit.

pub mod config;
pub mod error;
pub mod fetch;
pub mod hashing;
pub mod integrity;
pub mod manifest;
pub mod monitor;
pub mod paths;
pub mod reporter;
pub mod signature;
pub mod snapshot;

pub use config::Config;
pub use error::{Error, ErrorClass, Result};
pub use fetch::Fetcher;
pub use integrity::{ArtifactChecker, ArtifactOutcome};
pub use manifest::{ChecksumManifest, parse_manifest};
pub use monitor::{Monitor, RunReport, VersionReport, VersionStatus};
pub use reporter::{NullReporter, Reporter};
pub use signature::{TrustAnchor, verify};
pub use snapshot::{SnapshotStore, WriteOutcome};

/// User Agent string for remote requests
pub const USER_AGENT: &str = concat!("sigwatch/", env!("CARGO_PKG_VERSION"));
