//! XML-Enc primitives: RSA-OAEP key transport and AES-GCM content encryption.
//!
//! The wire layout for encrypted content is `nonce || ciphertext || tag`,
//! base64-encoded inside a `CipherValue` element. The content key is wrapped
//! to the recipient with RSA-OAEP (SHA-1 digest, per the XML-Enc default).

use aes_gcm::aead::Aead;
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::CryptoError;

/// OAEP mask digest selection.
///
/// `Sha1` matches the widely deployed `rsa-oaep-mgf1p` algorithm; `Sha256`
/// the XML-Enc 1.1 `rsa-oaep` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OaepDigest {
    /// SHA-1 mask digest (`rsa-oaep-mgf1p`).
    Sha1,
    /// SHA-256 mask digest (XML-Enc 1.1 `rsa-oaep`).
    Sha256,
}

impl OaepDigest {
    fn padding(self) -> Oaep {
        match self {
            Self::Sha1 => Oaep::new::<Sha1>(),
            Self::Sha256 => Oaep::new::<Sha256>(),
        }
    }
}

/// AES-GCM nonce length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Content-encryption key length for AES-256-GCM.
pub const CONTENT_KEY_LENGTH: usize = 32;

/// Generates a fresh AES-256 content-encryption key.
#[must_use]
pub fn generate_content_key() -> [u8; CONTENT_KEY_LENGTH] {
    let mut key = [0u8; CONTENT_KEY_LENGTH];
    OsRng.fill_bytes(&mut key);
    key
}

/// Wraps a content-encryption key to the recipient with RSA-OAEP.
pub fn wrap_key(
    recipient: &RsaPublicKey,
    key: &[u8],
    digest: OaepDigest,
) -> Result<Vec<u8>, CryptoError> {
    recipient
        .encrypt(&mut OsRng, digest.padding(), key)
        .map_err(|e| CryptoError::Encryption(format!("RSA-OAEP wrap failed: {e}")))
}

/// Unwraps a content-encryption key with the hub's private key.
pub fn unwrap_key(
    key: &RsaPrivateKey,
    wrapped: &[u8],
    digest: OaepDigest,
) -> Result<Vec<u8>, CryptoError> {
    key.decrypt(digest.padding(), wrapped)
        .map_err(|e| CryptoError::Decryption(format!("RSA-OAEP unwrap failed: {e}")))
}

/// Encrypts plaintext under a content key, returning `nonce || ct || tag`.
pub fn seal(content_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = match content_key.len() {
        16 => Aes128Gcm::new_from_slice(content_key)
            .map_err(|e| CryptoError::Encryption(format!("bad AES key: {e}")))?
            .encrypt(nonce, plaintext),
        32 => Aes256Gcm::new_from_slice(content_key)
            .map_err(|e| CryptoError::Encryption(format!("bad AES key: {e}")))?
            .encrypt(nonce, plaintext),
        other => {
            return Err(CryptoError::Encryption(format!(
                "unsupported content key length: {other} bytes"
            )))
        }
    }
    .map_err(|e| CryptoError::Encryption(format!("AES-GCM encryption failed: {e}")))?;

    let mut result = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypts a `nonce || ct || tag` blob under a content key.
pub fn open(content_key: &[u8], blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if blob.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(CryptoError::Decryption(
            "ciphertext too short".to_string(),
        ));
    }

    let (nonce_bytes, encrypted) = blob.split_at(NONCE_LENGTH);
    let nonce = Nonce::from_slice(nonce_bytes);

    match content_key.len() {
        16 => Aes128Gcm::new_from_slice(content_key)
            .map_err(|e| CryptoError::Decryption(format!("bad AES key: {e}")))?
            .decrypt(nonce, encrypted),
        32 => Aes256Gcm::new_from_slice(content_key)
            .map_err(|e| CryptoError::Decryption(format!("bad AES key: {e}")))?
            .decrypt(nonce, encrypted),
        other => {
            return Err(CryptoError::Decryption(format!(
                "unsupported content key length: {other} bytes"
            )))
        }
    }
    .map_err(|e| CryptoError::Decryption(format!("AES-GCM decryption failed: {e}")))
}
