//! Shared types for sigwatch.
//!
//! Everything in this crate is plain data: identifiers read from the remote
//! index, hex digests taken from checksum manifests, the signature scheme a
//! trust anchor is bound to, and the per-artifact verification outcome.
//! Fetching, parsing of remote documents and persistence live in
//! `sigwatch-core`.

pub mod digest;
pub mod index;
pub mod record;
pub mod scheme;

pub use digest::{HashAlgorithm, HexDigest};
pub use index::{IGNORED_ENTRIES, IndexOrder, Selection, VersionId, VersionIndex};
pub use record::VerificationRecord;
pub use scheme::SignatureScheme;

/// Errors raised when remote data does not fit one of the schema types.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The identifier cannot be used as a single path component.
    #[error("Invalid version identifier '{0}'")]
    InvalidVersionId(String),

    /// The value is not a hex digest of a supported length.
    #[error("Invalid digest '{value}': {reason}")]
    InvalidDigest {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The signature scheme name is not one we know.
    #[error("Unknown signature scheme '{0}' (expected ecdsa-p256-sha256 or ed25519)")]
    UnknownScheme(String),
}
