//! Error taxonomy for the verification pipeline.
//!
//! The classes matter more than the individual variants: the pipeline uses
//! [`Error::class`] to decide whether a failure stays local to one version
//! or stops the run, and the CLI uses it to pick how loudly to report.

use std::path::PathBuf;

use sigwatch_schema::SchemaError;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while watching a release.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a response.
    #[error("Request to {url} failed: {source}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Remote or local data is not in the expected shape.
    #[error("Malformed data: {0}")]
    Format(String),

    /// Trust material or settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A manifest signature did not verify.
    #[error("Signature over {version} does not verify against the trust anchor")]
    SignatureInvalid {
        /// Version whose manifest was rejected.
        version: String,
    },

    /// Downloaded bytes hash differently than the manifest says.
    #[error("Hash mismatch for {filename}: expected {expected}, got {actual}")]
    Integrity {
        /// Artifact file name.
        filename: String,
        /// Hash from the signed manifest.
        expected: String,
        /// Hash of the downloaded bytes.
        actual: String,
    },

    /// A stored marker disagrees with the manifest.
    #[error(
        "Marker for {filename} records {recorded} but the manifest expects {expected}; \
         the marker or the upstream manifest changed"
    )]
    MarkerMismatch {
        /// Artifact file name.
        filename: String,
        /// Hash from the signed manifest.
        expected: String,
        /// Hash stored in the marker.
        recorded: String,
    },

    /// The snapshot store could not be read or written.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transport failure, timeout or non-success status. Retryable by re-running.
    Network,
    /// Malformed remote data.
    Format,
    /// Missing or invalid trust material or settings.
    Config,
    /// A manifest signature did not verify.
    SignatureInvalid,
    /// An artifact (or its marker) disagrees with the manifest.
    Integrity,
    /// The local snapshot store could not be read or written.
    Storage,
}

impl Error {
    /// Coarse class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Network { .. } | Self::HttpStatus { .. } => ErrorClass::Network,
            Self::Format(_) => ErrorClass::Format,
            Self::Config(_) => ErrorClass::Config,
            Self::SignatureInvalid { .. } => ErrorClass::SignatureInvalid,
            Self::Integrity { .. } | Self::MarkerMismatch { .. } => ErrorClass::Integrity,
            Self::Io { .. } => ErrorClass::Storage,
        }
    }

    /// Failures that make every remaining version fail the same way.
    pub fn is_systemic(&self) -> bool {
        matches!(self.class(), ErrorClass::Config | ErrorClass::Storage)
    }

    /// Failures that indicate possible tampering and must be reported loudly.
    pub fn is_security(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::SignatureInvalid | ErrorClass::Integrity
        )
    }

    /// Transient transport failures worth another attempt within the run.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Self::Format(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_drive_policy() {
        let sig = Error::SignatureInvalid {
            version: "v1".into(),
        };
        assert!(sig.is_security());
        assert!(!sig.is_systemic());

        let cfg = Error::Config("no key".into());
        assert!(cfg.is_systemic());
        assert!(!cfg.is_retryable());

        let io = Error::io("/tmp/x", std::io::Error::other("disk full"));
        assert_eq!(io.class(), ErrorClass::Storage);
        assert!(io.is_systemic());
    }

    #[test]
    fn only_throttling_and_server_errors_are_retried() {
        let status = |status| Error::HttpStatus {
            url: "http://x".into(),
            status,
        };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(403).is_retryable());
    }

    #[test]
    fn integrity_is_never_retryable() {
        let err = Error::Integrity {
            filename: "app.bin".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.class(), ErrorClass::Integrity);
    }
}
