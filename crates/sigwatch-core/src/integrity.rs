//! Artifact integrity checking.
//!
//! Downloads each artifact a signature-verified manifest lists and compares
//! its hash with the manifest entry. A mismatch is final: it is returned as
//! [`Error::Integrity`], never retried, and leaves no marker behind.
//!
//! Markers only save bandwidth on later runs. They hold the hash computed
//! at verification time and are compared against the manifest again, but
//! they are not signed and removing or forging one is not defended against.

use futures::StreamExt;
use sigwatch_schema::{HexDigest, VerificationRecord, VersionId};

use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::hashing::ContentHasher;
use crate::manifest::ChecksumManifest;
use crate::snapshot::SnapshotStore;

/// Outcome of one manifest entry; `error` is set whenever the artifact is
/// not trusted.
#[derive(Debug)]
pub struct ArtifactOutcome {
    /// What was checked and computed.
    pub record: VerificationRecord,
    /// Why the artifact is not trusted, if it is not.
    pub error: Option<Error>,
}

impl ArtifactOutcome {
    /// Whether the artifact is trusted.
    pub fn is_verified(&self) -> bool {
        self.record.verified && self.error.is_none()
    }
}

/// Checks artifacts of signature-verified manifests.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactChecker<'a> {
    fetcher: &'a Fetcher,
    store: &'a SnapshotStore,
}

impl<'a> ArtifactChecker<'a> {
    /// Checker downloading through `fetcher` and keeping markers in `store`.
    pub fn new(fetcher: &'a Fetcher, store: &'a SnapshotStore) -> Self {
        Self { fetcher, store }
    }

    /// Verify one artifact of `version` against `expected`.
    ///
    /// # Errors
    ///
    /// - [`Error::Format`] if `expected` is not a supported hex digest or the
    ///   file name is unsafe,
    /// - [`Error::MarkerMismatch`] if an existing marker disagrees with the
    ///   manifest,
    /// - [`Error::Network`]/[`Error::HttpStatus`] if the download fails,
    /// - [`Error::Integrity`] if the downloaded bytes hash differently,
    /// - [`Error::Io`] if the marker cannot be written.
    pub async fn check_artifact(
        &self,
        version: &VersionId,
        filename: &str,
        expected: &str,
    ) -> Result<VerificationRecord> {
        let digest = HexDigest::new(expected)?;

        if let Some(recorded) = self.store.read_marker(version, filename)? {
            if digest.matches(&recorded) {
                tracing::debug!(%version, filename, "marker present, skipping download");
                return Ok(VerificationRecord::cached(filename, expected, &recorded));
            }
            return Err(Error::MarkerMismatch {
                filename: filename.to_string(),
                expected: digest.to_string(),
                recorded,
            });
        }

        let computed = self.download_hash(filename, &digest).await?;

        if !digest.matches(&computed) {
            tracing::error!(%version, filename, expected = %digest, actual = %computed, "artifact hash mismatch");
            return Err(Error::Integrity {
                filename: filename.to_string(),
                expected: digest.to_string(),
                actual: computed,
            });
        }

        self.store.write_marker(version, filename, &computed)?;
        tracing::info!(%version, filename, algorithm = %digest.algorithm(), "artifact verified");
        Ok(VerificationRecord::verified(filename, expected, &computed))
    }

    /// Check every entry of a trusted manifest.
    ///
    /// Failures of single artifacts are collected, not short-circuited, so
    /// each one reaches the operator.
    ///
    /// # Errors
    ///
    /// Only systemic failures (the snapshot store being unusable) abort.
    pub async fn check_manifest(
        &self,
        version: &VersionId,
        manifest: &ChecksumManifest,
    ) -> Result<Vec<ArtifactOutcome>> {
        let mut outcomes = Vec::with_capacity(manifest.len());

        for (filename, expected) in manifest.iter() {
            match self.check_artifact(version, filename, expected).await {
                Ok(record) => outcomes.push(ArtifactOutcome {
                    record,
                    error: None,
                }),
                Err(err) if err.is_systemic() => return Err(err),
                Err(err) => {
                    let computed = match &err {
                        Error::Integrity { actual, .. } => Some(actual.as_str()),
                        Error::MarkerMismatch { recorded, .. } => Some(recorded.as_str()),
                        _ => None,
                    };
                    outcomes.push(ArtifactOutcome {
                        record: VerificationRecord::failed(filename, expected, computed),
                        error: Some(err),
                    });
                }
            }
        }

        Ok(outcomes)
    }

    async fn download_hash(&self, filename: &str, digest: &HexDigest) -> Result<String> {
        let response = self.fetcher.artifact_response(filename).await?;
        let url = response.url().to_string();
        let mut stream = response.bytes_stream();
        let mut hasher = ContentHasher::new(digest.algorithm());
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| Error::Network {
                url: url.clone(),
                source,
            })?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
        }

        tracing::debug!(filename, bytes = downloaded, "artifact downloaded");
        Ok(hasher.finalize_hex())
    }
}
