//! Per-artifact verification outcome.

use serde::{Deserialize, Serialize};

/// What happened when one artifact was checked against its manifest entry.
///
/// Records live for one version's processing; only the marker of a verified
/// artifact outlives the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// File name as listed in the manifest.
    pub filename: String,
    /// Hash the manifest expects.
    pub expected_hash: String,
    /// Hash computed from the downloaded bytes, or read back from the marker
    /// for cached artifacts. `None` when nothing could be computed.
    pub computed_hash: Option<String>,
    /// Whether the artifact is trusted.
    pub verified: bool,
    /// Whether the result came from an existing marker instead of a download.
    pub cached: bool,
}

impl VerificationRecord {
    /// A freshly downloaded artifact whose hash matched.
    pub fn verified(filename: &str, expected: &str, computed: &str) -> Self {
        Self {
            filename: filename.to_string(),
            expected_hash: expected.to_string(),
            computed_hash: Some(computed.to_string()),
            verified: true,
            cached: false,
        }
    }

    /// An artifact skipped because its marker already recorded a match.
    pub fn cached(filename: &str, expected: &str, recorded: &str) -> Self {
        Self {
            filename: filename.to_string(),
            expected_hash: expected.to_string(),
            computed_hash: Some(recorded.to_string()),
            verified: true,
            cached: true,
        }
    }

    /// An artifact that is not trusted.
    pub fn failed(filename: &str, expected: &str, computed: Option<&str>) -> Self {
        Self {
            filename: filename.to_string(),
            expected_hash: expected.to_string(),
            computed_hash: computed.map(ToString::to_string),
            verified: false,
            cached: false,
        }
    }
}
