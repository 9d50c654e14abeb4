//! Reporter trait for dependency injection
//!
//! Lets the pipeline report per-version and per-artifact outcomes without
//! being coupled to a particular console or log format.

use sigwatch_schema::{VerificationRecord, VersionId};

use crate::error::Error;
use crate::monitor::RunReport;

/// Receives pipeline progress and outcomes.
pub trait Reporter: Send + Sync {
    /// The index was fetched; `selected` entries survived filtering.
    fn index_fetched(&self, total: usize, selected: usize);

    /// Processing of a version begins.
    fn version_started(&self, version: &VersionId);

    /// A manifest or signature snapshot was written for the first time.
    fn snapshot_written(&self, version: &VersionId, file_name: &str);

    /// The manifest signature verified against the trust anchor.
    fn signature_verified(&self, version: &VersionId);

    /// The manifest signature did NOT verify. Possible supply-chain compromise.
    fn signature_invalid(&self, version: &VersionId);

    /// An artifact matched its manifest entry (freshly or from its marker).
    fn artifact_verified(&self, version: &VersionId, record: &VerificationRecord);

    /// An artifact could not be trusted.
    fn artifact_failed(&self, version: &VersionId, record: &VerificationRecord, error: &Error);

    /// A version could not be processed.
    fn version_failed(&self, version: &VersionId, error: &Error);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Display the outcome of the whole run.
    fn summary(&self, report: &RunReport);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn index_fetched(&self, total: usize, selected: usize) {
        (**self).index_fetched(total, selected);
    }
    fn version_started(&self, version: &VersionId) {
        (**self).version_started(version);
    }
    fn snapshot_written(&self, version: &VersionId, file_name: &str) {
        (**self).snapshot_written(version, file_name);
    }
    fn signature_verified(&self, version: &VersionId) {
        (**self).signature_verified(version);
    }
    fn signature_invalid(&self, version: &VersionId) {
        (**self).signature_invalid(version);
    }
    fn artifact_verified(&self, version: &VersionId, record: &VerificationRecord) {
        (**self).artifact_verified(version, record);
    }
    fn artifact_failed(&self, version: &VersionId, record: &VerificationRecord, error: &Error) {
        (**self).artifact_failed(version, record, error);
    }
    fn version_failed(&self, version: &VersionId, error: &Error) {
        (**self).version_failed(version, error);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn summary(&self, report: &RunReport) {
        (**self).summary(report);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn index_fetched(&self, _: usize, _: usize) {}
    fn version_started(&self, _: &VersionId) {}
    fn snapshot_written(&self, _: &VersionId, _: &str) {}
    fn signature_verified(&self, _: &VersionId) {}
    fn signature_invalid(&self, _: &VersionId) {}
    fn artifact_verified(&self, _: &VersionId, _: &VerificationRecord) {}
    fn artifact_failed(&self, _: &VersionId, _: &VerificationRecord, _: &Error) {}
    fn version_failed(&self, _: &VersionId, _: &Error) {}
    fn warning(&self, _: &str) {}
    fn summary(&self, _: &RunReport) {}
}
