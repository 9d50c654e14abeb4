//! Detached signature verification against the provisioned trust anchor.
//!
//! Verification runs in-process. The outcome of a well-formed check is a
//! plain `bool`: a signature that does not match is an expected condition
//! the caller acts on, while unusable inputs (no key, unreadable key,
//! signature bytes that can not belong to the scheme) are errors.

use std::fmt;
use std::path::Path;

use base64::Engine;
use sigwatch_schema::SignatureScheme;

use crate::error::{Error, Result};

/// DER-encoded P-256 signatures are between 8 and 72 bytes long.
const ECDSA_P256_DER_LEN: std::ops::RangeInclusive<usize> = 8..=72;
const ECDSA_P256_RAW_LEN: usize = 64;
/// Base64 text of a 64-byte Ed25519 signature, padded or not, with room for
/// a trailing newline.
const ED25519_BASE64_LEN: std::ops::RangeInclusive<usize> = 86..=90;

/// The publisher's public key, loaded once per run and never mutated.
#[derive(Clone)]
pub struct TrustAnchor {
    key: AnchorKey,
}

#[derive(Clone)]
enum AnchorKey {
    EcdsaP256(p256::ecdsa::VerifyingKey),
    Ed25519(ed25519_dalek::VerifyingKey),
}

impl fmt::Debug for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustAnchor")
            .field("scheme", &self.scheme())
            .finish_non_exhaustive()
    }
}

impl TrustAnchor {
    /// Load the key file at `path` for the given scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is missing, unreadable or does
    /// not hold a key of the configured scheme.
    pub fn load(path: &Path, scheme: SignatureScheme) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Config(format!("trust anchor {} is not readable: {e}", path.display()))
        })?;
        let anchor = Self::from_bytes(&bytes, scheme)
            .map_err(|e| Error::Config(format!("trust anchor {}: {e}", path.display())))?;
        tracing::debug!(scheme = %scheme, "loaded trust anchor from {}", path.display());
        Ok(anchor)
    }

    /// Decode key material.
    ///
    /// P-256 keys are PEM or DER `SubjectPublicKeyInfo`; Ed25519 keys are 32
    /// raw bytes or base64 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the bytes are not a key of `scheme`.
    pub fn from_bytes(bytes: &[u8], scheme: SignatureScheme) -> Result<Self> {
        let key = match scheme {
            SignatureScheme::EcdsaP256Sha256 => AnchorKey::EcdsaP256(decode_p256_key(bytes)?),
            SignatureScheme::Ed25519 => AnchorKey::Ed25519(decode_ed25519_key(bytes)?),
        };
        Ok(Self { key })
    }

    /// Scheme the key belongs to.
    pub fn scheme(&self) -> SignatureScheme {
        match self.key {
            AnchorKey::EcdsaP256(_) => SignatureScheme::EcdsaP256Sha256,
            AnchorKey::Ed25519(_) => SignatureScheme::Ed25519,
        }
    }
}

fn decode_p256_key(bytes: &[u8]) -> Result<p256::ecdsa::VerifyingKey> {
    use p256::pkcs8::DecodePublicKey;

    let decoded = match std::str::from_utf8(bytes) {
        Ok(text) if text.trim_start().starts_with("-----BEGIN") => {
            p256::ecdsa::VerifyingKey::from_public_key_pem(text.trim())
        }
        _ => p256::ecdsa::VerifyingKey::from_public_key_der(bytes),
    };
    decoded.map_err(|e| Error::Config(format!("not a P-256 public key: {e}")))
}

fn decode_ed25519_key(bytes: &[u8]) -> Result<ed25519_dalek::VerifyingKey> {
    let raw = raw_or_base64(bytes, ed25519_dalek::PUBLIC_KEY_LENGTH)
        .ok_or_else(|| Error::Config("Ed25519 key must be 32 raw bytes or base64".into()))?;
    let mut key = [0u8; ed25519_dalek::PUBLIC_KEY_LENGTH];
    key.copy_from_slice(&raw);
    ed25519_dalek::VerifyingKey::from_bytes(&key)
        .map_err(|e| Error::Config(format!("invalid Ed25519 public key: {e}")))
}

/// Accept `expected_len` raw bytes, or base64 text decoding to that length.
fn raw_or_base64(bytes: &[u8], expected_len: usize) -> Option<Vec<u8>> {
    if bytes.len() == expected_len {
        return Some(bytes.to_vec());
    }
    decode_base64(bytes, expected_len)
}

fn decode_base64(bytes: &[u8], expected_len: usize) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(bytes).ok()?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .ok()?;
    (decoded.len() == expected_len).then_some(decoded)
}

/// Check a detached signature over `payload`.
///
/// Returns `Ok(false)` for a signature that does not verify, including
/// signature bytes of a plausible size whose encoding was corrupted.
///
/// # Errors
///
/// Returns [`Error::Format`] for an empty signature or one whose size can
/// not belong to the anchor's scheme.
pub fn verify(payload: &[u8], signature: &[u8], anchor: &TrustAnchor) -> Result<bool> {
    if signature.is_empty() {
        return Err(Error::Format("detached signature is empty".into()));
    }

    match &anchor.key {
        AnchorKey::EcdsaP256(key) => verify_p256(payload, signature, key),
        AnchorKey::Ed25519(key) => verify_ed25519(payload, signature, key),
    }
}

fn verify_p256(
    payload: &[u8],
    signature: &[u8],
    key: &p256::ecdsa::VerifyingKey,
) -> Result<bool> {
    use p256::ecdsa::Signature;
    use p256::ecdsa::signature::Verifier;

    if !ECDSA_P256_DER_LEN.contains(&signature.len()) {
        return Err(Error::Format(format!(
            "{}-byte signature can not be ECDSA P-256",
            signature.len()
        )));
    }

    let parsed = Signature::from_der(signature).or_else(|der_err| {
        if signature.len() == ECDSA_P256_RAW_LEN {
            Signature::from_slice(signature)
        } else {
            Err(der_err)
        }
    });

    match parsed {
        // `verify` hashes the payload with SHA-256 before checking.
        Ok(sig) => Ok(key.verify(payload, &sig).is_ok()),
        Err(e) => {
            tracing::debug!("signature does not decode as ECDSA P-256: {e}");
            Ok(false)
        }
    }
}

fn verify_ed25519(
    payload: &[u8],
    signature: &[u8],
    key: &ed25519_dalek::VerifyingKey,
) -> Result<bool> {
    use ed25519_dalek::{Signature, Verifier};

    let raw = if signature.len() == ed25519_dalek::SIGNATURE_LENGTH {
        signature.to_vec()
    } else if ED25519_BASE64_LEN.contains(&signature.len()) {
        match decode_base64(signature, ed25519_dalek::SIGNATURE_LENGTH) {
            Some(raw) => raw,
            None => {
                tracing::debug!("signature text does not decode as a base64 Ed25519 signature");
                return Ok(false);
            }
        }
    } else {
        return Err(Error::Format(format!(
            "{}-byte signature is neither a raw nor a base64 Ed25519 signature",
            signature.len()
        )));
    };
    let mut bytes = [0u8; ed25519_dalek::SIGNATURE_LENGTH];
    bytes.copy_from_slice(&raw);
    let sig = Signature::from_bytes(&bytes);

    Ok(key.verify(payload, &sig).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ed25519_signing_key() -> ed25519_dalek::SigningKey {
        ed25519_dalek::SigningKey::from_bytes(&[7u8; 32])
    }

    fn ed25519_anchor() -> TrustAnchor {
        let public = ed25519_signing_key().verifying_key().to_bytes();
        TrustAnchor::from_bytes(&public, SignatureScheme::Ed25519).unwrap()
    }

    fn ed25519_sign(payload: &[u8]) -> Vec<u8> {
        use ed25519_dalek::Signer;
        ed25519_signing_key().sign(payload).to_bytes().to_vec()
    }

    fn p256_signing_key() -> p256::ecdsa::SigningKey {
        p256::ecdsa::SigningKey::from_slice(&[0x11; 32]).unwrap()
    }

    fn p256_pem() -> String {
        use p256::pkcs8::{EncodePublicKey, LineEnding};
        p256_signing_key()
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap()
    }

    fn p256_sign_der(payload: &[u8]) -> Vec<u8> {
        use p256::ecdsa::signature::Signer;
        let sig: p256::ecdsa::Signature = p256_signing_key().sign(payload);
        sig.to_der().as_bytes().to_vec()
    }

    fn flip(bytes: &[u8], bit: usize) -> Vec<u8> {
        let mut out = bytes.to_vec();
        out[bit / 8] ^= 1 << (bit % 8);
        out
    }

    const PAYLOAD: &[u8] = b"abc123  app.bin\n";

    #[test]
    fn ed25519_genuine_signature_verifies() {
        let anchor = ed25519_anchor();
        let sig = ed25519_sign(PAYLOAD);
        assert!(verify(PAYLOAD, &sig, &anchor).unwrap());
    }

    #[test]
    fn ed25519_base64_signature_and_key_are_accepted() {
        let engine = base64::engine::general_purpose::STANDARD;
        let public = engine.encode(ed25519_signing_key().verifying_key().to_bytes());
        let anchor =
            TrustAnchor::from_bytes(format!("{public}\n").as_bytes(), SignatureScheme::Ed25519)
                .unwrap();
        let sig = engine.encode(ed25519_sign(PAYLOAD));
        assert!(verify(PAYLOAD, sig.as_bytes(), &anchor).unwrap());
    }

    #[test]
    fn ed25519_any_single_bit_flip_fails() {
        let anchor = ed25519_anchor();
        let sig = ed25519_sign(PAYLOAD);

        for bit in 0..PAYLOAD.len() * 8 {
            assert!(!verify(&flip(PAYLOAD, bit), &sig, &anchor).unwrap(), "payload bit {bit}");
        }
        for bit in 0..sig.len() * 8 {
            assert!(!verify(PAYLOAD, &flip(&sig, bit), &anchor).unwrap(), "signature bit {bit}");
        }
    }

    #[test]
    fn ed25519_base64_signature_bit_flip_fails() {
        let anchor = ed25519_anchor();
        let engine = base64::engine::general_purpose::STANDARD;
        let sig = engine.encode(ed25519_sign(PAYLOAD)).into_bytes();
        assert_eq!(sig.len(), 88);

        for bit in 0..sig.len() * 8 {
            assert!(
                !verify(PAYLOAD, &flip(&sig, bit), &anchor).unwrap(),
                "signature bit {bit}"
            );
        }

        let mut with_newline = sig.clone();
        with_newline.push(b'\n');
        assert!(verify(PAYLOAD, &with_newline, &anchor).unwrap());
    }

    #[test]
    fn p256_der_signature_verifies_against_pem_key() {
        let anchor =
            TrustAnchor::from_bytes(p256_pem().as_bytes(), SignatureScheme::EcdsaP256Sha256)
                .unwrap();
        let sig = p256_sign_der(PAYLOAD);
        assert!(verify(PAYLOAD, &sig, &anchor).unwrap());
    }

    #[test]
    fn p256_any_single_bit_flip_fails() {
        let anchor =
            TrustAnchor::from_bytes(p256_pem().as_bytes(), SignatureScheme::EcdsaP256Sha256)
                .unwrap();
        let sig = p256_sign_der(PAYLOAD);

        for bit in 0..PAYLOAD.len() * 8 {
            assert!(!verify(&flip(PAYLOAD, bit), &sig, &anchor).unwrap(), "payload bit {bit}");
        }
        for bit in 0..sig.len() * 8 {
            assert!(!verify(PAYLOAD, &flip(&sig, bit), &anchor).unwrap(), "signature bit {bit}");
        }
    }

    #[test]
    fn wrong_key_is_a_plain_false() {
        let other = ed25519_dalek::SigningKey::from_bytes(&[9u8; 32]);
        let anchor =
            TrustAnchor::from_bytes(&other.verifying_key().to_bytes(), SignatureScheme::Ed25519)
                .unwrap();
        assert!(!verify(PAYLOAD, &ed25519_sign(PAYLOAD), &anchor).unwrap());
    }

    #[test]
    fn malformed_signatures_are_format_errors() {
        let ed = ed25519_anchor();
        assert!(matches!(verify(PAYLOAD, &[], &ed), Err(Error::Format(_))));
        assert!(matches!(verify(PAYLOAD, &[1, 2, 3], &ed), Err(Error::Format(_))));

        let ec =
            TrustAnchor::from_bytes(p256_pem().as_bytes(), SignatureScheme::EcdsaP256Sha256)
                .unwrap();
        assert!(matches!(verify(PAYLOAD, &[0u8; 200], &ec), Err(Error::Format(_))));
    }

    #[test]
    fn key_of_the_wrong_scheme_is_a_config_error() {
        let err = TrustAnchor::from_bytes(p256_pem().as_bytes(), SignatureScheme::Ed25519)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = TrustAnchor::from_bytes(&[1u8; 32], SignatureScheme::EcdsaP256Sha256)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_key_file_is_a_config_error() {
        let err = TrustAnchor::load(Path::new("/nonexistent/key.pem"), SignatureScheme::default())
            .unwrap_err();
        assert!(err.is_systemic());
    }
}
