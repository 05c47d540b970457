//! Cryptographic primitives for the identity-federation hub.
//!
//! This crate owns everything the SAML pipeline needs from the crypto
//! ecosystem, so `hub-saml` never touches key material directly:
//!
//! - [`hash`] - SHA-2 digests for XML-DSig references
//! - [`signature`] - RSA PKCS#1 v1.5 signing and verification
//! - [`credentials`] - typed key material plus the key-store interfaces
//! - [`xmlenc`] - RSA-OAEP key transport and AES-GCM content encryption
//!
//! Credential *sets* are ordered: the current key first, then its
//! predecessors, so both signature validation and decryption survive key
//! rollover without downtime.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credentials;
pub mod error;
pub mod hash;
pub mod signature;
pub mod xmlenc;

pub use credentials::{
    DecryptingCredential, DecryptionKeyStore, EncryptionCredential, InMemoryDecryptionKeyStore,
    InMemorySigningKeyStore, SigningCredential, SigningKeyStore, VerificationCredential,
};
pub use error::{CryptoError, CryptoResult};
pub use hash::{sha256, sha384, sha512};
pub use signature::{rsa_sign, rsa_verify, RsaAlgorithm};
