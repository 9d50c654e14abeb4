//! Signature schemes a trust anchor can be bound to.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{HashAlgorithm, SchemaError};

/// The digest/signature pair used to check detached manifest signatures.
///
/// The scheme is configured next to the key file and never guessed from the
/// key or the signature bytes. New schemes get a new variant and a new name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureScheme {
    /// ECDSA over NIST P-256 with a SHA-256 message digest. Keys are PEM
    /// `SubjectPublicKeyInfo`, signatures ASN.1 DER, the same pairing as
    /// `openssl dgst -sha256 -verify`.
    #[default]
    #[serde(rename = "ecdsa-p256-sha256")]
    EcdsaP256Sha256,
    /// Pure Ed25519 (RFC 8032). Keys are 32 raw bytes or their base64
    /// text, signatures 64 raw bytes or their base64 text.
    #[serde(rename = "ed25519")]
    Ed25519,
}

impl SignatureScheme {
    /// Every supported scheme.
    pub const ALL: [Self; 2] = [Self::EcdsaP256Sha256, Self::Ed25519];

    /// Stable configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EcdsaP256Sha256 => "ecdsa-p256-sha256",
            Self::Ed25519 => "ed25519",
        }
    }

    /// Separate message digest applied before signing, if the scheme has one.
    pub fn message_digest(self) -> Option<HashAlgorithm> {
        match self {
            Self::EcdsaP256Sha256 => Some(HashAlgorithm::Sha256),
            Self::Ed25519 => None,
        }
    }
}

impl std::fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureScheme {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SchemaError::UnknownScheme(s.to_string()))
    }
}
