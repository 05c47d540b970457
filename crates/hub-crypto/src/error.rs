//! Error types for cryptographic operations.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by key handling, signing and encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material could not be parsed or is the wrong kind.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Certificate parsing failed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Key unwrap or content decryption failed.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Key wrap or content encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),
}
