//! The verification run.
//!
//! Fetch the index, snapshot it, then for every candidate version:
//! snapshot manifest and signature (first write wins), verify the signature
//! over the stored manifest, and only then check the artifacts it lists.
//! Versions are processed sequentially and independently; a failure in one
//! is reported and the run moves on unless the failure is systemic.

use std::fmt;
use std::sync::Arc;

use sigwatch_schema::{VerificationRecord, VersionId};

use crate::config::Config;
use crate::error::{Error, ErrorClass, Result};
use crate::fetch::Fetcher;
use crate::integrity::ArtifactChecker;
use crate::manifest::parse_manifest;
use crate::paths;
use crate::reporter::Reporter;
use crate::signature::{self, TrustAnchor};
use crate::snapshot::SnapshotStore;

/// How one version ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    /// Signature valid and every checked artifact matched.
    Verified,
    /// The manifest signature did not verify; no artifact was touched.
    SignatureInvalid,
    /// Signature valid, but some artifacts are not trusted. `integrity`
    /// counts hash or marker mismatches; `other` counts artifacts that could
    /// not be checked (download failures, unsupported digests).
    ArtifactFailures {
        /// Artifacts that disagree with the manifest.
        integrity: usize,
        /// Artifacts that could not be checked.
        other: usize,
    },
    /// The version could not be processed (fetch or format failure).
    Failed(ErrorClass),
}

/// Outcome of one version.
#[derive(Debug, Clone)]
pub struct VersionReport {
    /// The version processed.
    pub version: VersionId,
    /// How it ended.
    pub status: VersionStatus,
    /// One record per checked artifact.
    pub artifacts: Vec<VerificationRecord>,
    /// Human-readable failure descriptions, in the order they occurred.
    pub errors: Vec<String>,
}

impl VersionReport {
    fn failed(version: &VersionId, err: &Error) -> Self {
        let status = match err {
            Error::SignatureInvalid { .. } => VersionStatus::SignatureInvalid,
            other => VersionStatus::Failed(other.class()),
        };
        Self {
            version: version.clone(),
            status,
            artifacts: Vec::new(),
            errors: vec![err.to_string()],
        }
    }

    /// Signature and every checked artifact verified.
    pub fn is_verified(&self) -> bool {
        self.status == VersionStatus::Verified
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Raw entries in the fetched index.
    pub index_entries: usize,
    /// Whether today's index snapshot was written by this run.
    pub index_recorded: bool,
    /// Per-version outcomes, in processing order.
    pub versions: Vec<VersionReport>,
}

impl RunReport {
    /// Versions whose manifest signature did not verify.
    pub fn signature_failures(&self) -> usize {
        self.count(|r| r.status == VersionStatus::SignatureInvalid)
    }

    /// Artifacts whose content disagreed with the signed manifest.
    pub fn integrity_failures(&self) -> usize {
        self.versions
            .iter()
            .map(|r| match r.status {
                VersionStatus::ArtifactFailures { integrity, .. } => integrity,
                _ => 0,
            })
            .sum()
    }

    /// Artifacts that could not be checked at all.
    pub fn unchecked_artifacts(&self) -> usize {
        self.versions
            .iter()
            .map(|r| match r.status {
                VersionStatus::ArtifactFailures { other, .. } => other,
                _ => 0,
            })
            .sum()
    }

    /// Versions that could not be processed at all.
    pub fn fetch_failures(&self) -> usize {
        self.count(|r| matches!(r.status, VersionStatus::Failed(_)))
    }

    /// Versions that fully verified.
    pub fn verified_versions(&self) -> usize {
        self.count(VersionReport::is_verified)
    }

    /// Artifacts verified by download or by marker.
    pub fn verified_artifacts(&self) -> usize {
        self.versions
            .iter()
            .flat_map(|r| &r.artifacts)
            .filter(|a| a.verified)
            .count()
    }

    /// Any signature or integrity failure: possible tampering.
    pub fn has_security_failures(&self) -> bool {
        self.signature_failures() > 0 || self.integrity_failures() > 0
    }

    /// Every processed version verified.
    pub fn is_success(&self) -> bool {
        self.versions.iter().all(VersionReport::is_verified)
    }

    fn count(&self, pred: impl Fn(&VersionReport) -> bool) -> usize {
        self.versions.iter().filter(|r| pred(r)).count()
    }
}

/// Runs the pipeline against one configuration.
pub struct Monitor {
    config: Config,
    fetcher: Fetcher,
    store: SnapshotStore,
    anchor: TrustAnchor,
    reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("root", &self.store.root())
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Validate the configuration, load the trust anchor and prepare the
    /// snapshot root.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for invalid settings or trust material,
    /// [`Error::Io`] if the root cannot be created.
    pub fn new(config: Config, reporter: Arc<dyn Reporter>) -> Result<Self> {
        config.validate()?;
        let anchor = TrustAnchor::load(&config.trust_anchor, config.scheme)?;
        let fetcher = Fetcher::new(&config)?;
        let store = SnapshotStore::new(&config.root);
        store.init()?;
        Ok(Self::from_parts(config, fetcher, store, anchor, reporter))
    }

    /// Assemble from already-built components.
    pub fn from_parts(
        config: Config,
        fetcher: Fetcher,
        store: SnapshotStore,
        anchor: TrustAnchor,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            fetcher,
            store,
            anchor,
            reporter,
        }
    }

    /// The snapshot store this monitor writes to.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Run against today's local date.
    ///
    /// # Errors
    ///
    /// See [`Monitor::run_at`].
    pub async fn run(&self, limit: Option<usize>) -> Result<RunReport> {
        self.run_at(chrono::Local::now().date_naive(), limit).await
    }

    /// Run, recording the index snapshot under `date`, processing at most
    /// `limit` versions.
    ///
    /// # Errors
    ///
    /// Fails if the index cannot be fetched or a systemic error (trust
    /// material, snapshot store) occurs. Per-version failures are part of
    /// the returned report instead.
    pub async fn run_at(&self, date: chrono::NaiveDate, limit: Option<usize>) -> Result<RunReport> {
        let index = self.fetcher.fetch_index().await?;
        let index_recorded = self.store.record_index(&index, date)?.created();

        let selection = index.select(self.config.order, &self.config.ignore);
        for rejected in &selection.rejected {
            let msg = format!("ignoring index entry with unsafe name '{rejected}'");
            tracing::warn!("{msg}");
            self.reporter.warning(&msg);
        }

        let mut versions = selection.versions;
        if let Some(limit) = limit {
            versions.truncate(limit);
        }
        self.reporter.index_fetched(index.len(), versions.len());
        tracing::info!(entries = index.len(), selected = versions.len(), "index fetched");

        let mut report = RunReport {
            index_entries: index.len(),
            index_recorded,
            versions: Vec::with_capacity(versions.len()),
        };

        for version in &versions {
            self.reporter.version_started(version);
            match self.process_version(version).await {
                Ok(version_report) => report.versions.push(version_report),
                Err(err) => {
                    if let Error::SignatureInvalid { .. } = err {
                        tracing::error!(%version, "manifest signature INVALID, artifacts not checked");
                        self.reporter.signature_invalid(version);
                    } else {
                        tracing::warn!(%version, "version failed: {err}");
                        self.reporter.version_failed(version, &err);
                    }
                    if err.is_systemic() {
                        return Err(err);
                    }
                    report.versions.push(VersionReport::failed(version, &err));
                }
            }
        }

        self.reporter.summary(&report);
        Ok(report)
    }

    /// Snapshot, verify and check one version.
    ///
    /// # Errors
    ///
    /// [`Error::SignatureInvalid`] when the signature does not verify; fetch,
    /// format and storage errors as they occur. Artifact failures are part
    /// of the returned report.
    pub async fn process_version(&self, version: &VersionId) -> Result<VersionReport> {
        self.ensure_manifest(version).await?;
        self.ensure_signature(version).await?;

        let text = self.store.read_manifest(version)?;
        let sig = self.store.read_signature(version)?;

        if !signature::verify(text.as_bytes(), &sig, &self.anchor)? {
            return Err(Error::SignatureInvalid {
                version: version.to_string(),
            });
        }
        self.reporter.signature_verified(version);
        tracing::info!(%version, scheme = %self.anchor.scheme(), "manifest signature verified");

        let manifest = parse_manifest(&text)?;
        if manifest.is_empty() {
            let msg = format!("manifest of {version} lists no artifacts");
            tracing::warn!("{msg}");
            self.reporter.warning(&msg);
        }

        if !self.config.verify_artifacts {
            return Ok(VersionReport {
                version: version.clone(),
                status: VersionStatus::Verified,
                artifacts: Vec::new(),
                errors: Vec::new(),
            });
        }

        let checker = ArtifactChecker::new(&self.fetcher, &self.store);
        let outcomes = checker.check_manifest(version, &manifest).await?;

        let mut integrity = 0;
        let mut other = 0;
        let mut artifacts = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for outcome in outcomes {
            match &outcome.error {
                None => self.reporter.artifact_verified(version, &outcome.record),
                Some(err) => {
                    if err.is_security() {
                        integrity += 1;
                    } else {
                        other += 1;
                    }
                    errors.push(err.to_string());
                    self.reporter.artifact_failed(version, &outcome.record, err);
                }
            }
            artifacts.push(outcome.record);
        }

        let status = if integrity + other == 0 {
            VersionStatus::Verified
        } else {
            VersionStatus::ArtifactFailures { integrity, other }
        };
        Ok(VersionReport {
            version: version.clone(),
            status,
            artifacts,
            errors,
        })
    }

    async fn ensure_manifest(&self, version: &VersionId) -> Result<()> {
        if self.store.has_manifest(version) {
            return Ok(());
        }
        let text = self.fetcher.fetch_manifest(version).await?;
        if self.store.write_manifest(version, &text)?.created() {
            self.reporter
                .snapshot_written(version, &paths::manifest_file_name(version));
        }
        Ok(())
    }

    async fn ensure_signature(&self, version: &VersionId) -> Result<()> {
        if self.store.has_signature(version) {
            return Ok(());
        }
        let sig = self.fetcher.fetch_signature(version).await?;
        if self.store.write_signature(version, &sig)?.created() {
            self.reporter
                .snapshot_written(version, &paths::signature_file_name(version));
        }
        Ok(())
    }
}
