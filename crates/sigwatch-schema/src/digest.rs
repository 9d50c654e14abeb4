//! Hex digests as they appear in checksum manifests.

use serde::{Deserialize, Deserializer, Serialize};

use crate::SchemaError;

/// Digest algorithm implied by the length of a hex digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256, 64 hex characters.
    Sha256,
    /// SHA-512, 128 hex characters (what `sha512sum` produces).
    Sha512,
}

impl HashAlgorithm {
    /// Pick the algorithm from the number of hex characters in a digest.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            64 => Some(Self::Sha256),
            128 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Number of hex characters a digest of this algorithm has.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated hex digest, normalized to lowercase.
///
/// The algorithm is never stored separately: it follows from the length, so
/// a manifest line can not claim one algorithm while carrying a digest of
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexDigest(String);

impl HexDigest {
    /// Validate `s` as a SHA-256 or SHA-512 hex digest.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidDigest`] when `s` contains non-hex
    /// characters or has a length that maps to no supported algorithm.
    pub fn new(s: &str) -> Result<Self, SchemaError> {
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SchemaError::InvalidDigest {
                value: s.to_string(),
                reason: "contains non-hex characters",
            });
        }
        if HashAlgorithm::from_hex_len(s.len()).is_none() {
            return Err(SchemaError::InvalidDigest {
                value: s.to_string(),
                reason: "expected 64 (sha256) or 128 (sha512) hex characters",
            });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The algorithm this digest was produced with.
    pub fn algorithm(&self) -> HashAlgorithm {
        // Length was checked in `new`.
        HashAlgorithm::from_hex_len(self.0.len()).unwrap_or(HashAlgorithm::Sha512)
    }

    /// Case-insensitive comparison against another hex string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }

    /// Return the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for HexDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for HexDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HexDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
