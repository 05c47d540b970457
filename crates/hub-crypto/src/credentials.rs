//! Typed key material and the key-store interfaces.
//!
//! A credential ties a key to its entity association. Stores return
//! credential sets ordered newest-usable-first so callers can walk them
//! during key rollover.

use std::collections::HashMap;
use std::fmt;

use crate::error::CryptoError;

/// A public key trusted to verify signatures from one entity.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCredential {
    entity_id: String,
    /// RSA public key in PKCS#1 DER form (`RSAPublicKey`).
    public_key: Vec<u8>,
}

impl VerificationCredential {
    /// Creates a verification credential for the given entity.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, public_key: Vec<u8>) -> Self {
        Self {
            entity_id: entity_id.into(),
            public_key,
        }
    }

    /// Builds a verification credential from an X.509 certificate.
    pub fn from_certificate(
        entity_id: impl Into<String>,
        certificate_der: &[u8],
    ) -> Result<Self, CryptoError> {
        Ok(Self::new(
            entity_id,
            rsa_public_key_from_certificate(certificate_der)?,
        ))
    }

    /// The entity this key belongs to.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The RSA public key in PKCS#1 DER form.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

impl fmt::Debug for VerificationCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationCredential")
            .field("entity_id", &self.entity_id)
            .finish_non_exhaustive()
    }
}

/// A private key the hub signs with, plus its optional certificate.
#[derive(Clone)]
pub struct SigningCredential {
    entity_id: String,
    /// RSA private key in DER form (PKCS#1 or PKCS#8).
    private_key: Vec<u8>,
    /// X.509 certificate in DER form, embedded in signatures when present.
    certificate: Option<Vec<u8>>,
}

impl SigningCredential {
    /// Creates a signing credential for the given entity.
    #[must_use]
    pub fn new(
        entity_id: impl Into<String>,
        private_key: Vec<u8>,
        certificate: Option<Vec<u8>>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            private_key,
            certificate,
        }
    }

    /// The entity this key signs for.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The RSA private key in DER form.
    #[must_use]
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// The certificate to embed in signatures, if any.
    #[must_use]
    pub fn certificate(&self) -> Option<&[u8]> {
        self.certificate.as_deref()
    }
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredential")
            .field("entity_id", &self.entity_id)
            .finish_non_exhaustive()
    }
}

/// A private key the hub decrypts inbound assertions with.
#[derive(Clone)]
pub struct DecryptingCredential {
    key: rsa::RsaPrivateKey,
}

impl DecryptingCredential {
    /// Wraps an RSA private key for decryption.
    #[must_use]
    pub fn new(key: rsa::RsaPrivateKey) -> Self {
        Self { key }
    }

    /// The RSA private key.
    #[must_use]
    pub fn key(&self) -> &rsa::RsaPrivateKey {
        &self.key
    }
}

impl fmt::Debug for DecryptingCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptingCredential").finish_non_exhaustive()
    }
}

/// A recipient's public key the hub encrypts outbound assertions to.
#[derive(Clone)]
pub struct EncryptionCredential {
    entity_id: String,
    key: rsa::RsaPublicKey,
}

impl EncryptionCredential {
    /// Creates an encryption credential for the given recipient.
    #[must_use]
    pub fn new(entity_id: impl Into<String>, key: rsa::RsaPublicKey) -> Self {
        Self {
            entity_id: entity_id.into(),
            key,
        }
    }

    /// The recipient entity.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The recipient's RSA public key.
    #[must_use]
    pub fn key(&self) -> &rsa::RsaPublicKey {
        &self.key
    }
}

impl fmt::Debug for EncryptionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionCredential")
            .field("entity_id", &self.entity_id)
            .finish_non_exhaustive()
    }
}

/// Resolves the verification credentials trusted for an entity,
/// newest usable key first.
pub trait SigningKeyStore: Send + Sync {
    /// Returns the ordered credential set for the entity, empty if unknown.
    fn credentials_for(&self, entity_id: &str) -> Vec<VerificationCredential>;
}

/// Resolves the hub's own decryption keys, current key first.
pub trait DecryptionKeyStore: Send + Sync {
    /// Returns the ordered decrypting credential set.
    fn decrypting_credentials(&self) -> Vec<DecryptingCredential>;
}

/// In-memory signing-key store, loaded once per configuration generation.
#[derive(Debug, Default)]
pub struct InMemorySigningKeyStore {
    by_entity: HashMap<String, Vec<VerificationCredential>>,
}

impl InMemorySigningKeyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a credential for its entity. Insertion order is resolution
    /// order, so insert the current key before its predecessors.
    pub fn add(&mut self, credential: VerificationCredential) {
        self.by_entity
            .entry(credential.entity_id().to_string())
            .or_default()
            .push(credential);
    }
}

impl SigningKeyStore for InMemorySigningKeyStore {
    fn credentials_for(&self, entity_id: &str) -> Vec<VerificationCredential> {
        self.by_entity.get(entity_id).cloned().unwrap_or_default()
    }
}

/// In-memory decryption-key store.
#[derive(Debug, Default)]
pub struct InMemoryDecryptionKeyStore {
    credentials: Vec<DecryptingCredential>,
}

impl InMemoryDecryptionKeyStore {
    /// Creates a store from an ordered credential list, current key first.
    #[must_use]
    pub fn new(credentials: Vec<DecryptingCredential>) -> Self {
        Self { credentials }
    }
}

impl DecryptionKeyStore for InMemoryDecryptionKeyStore {
    fn decrypting_credentials(&self) -> Vec<DecryptingCredential> {
        self.credentials.clone()
    }
}

/// Extracts the RSA public key (PKCS#1 DER) from an X.509 certificate.
pub fn rsa_public_key_from_certificate(cert_der: &[u8]) -> Result<Vec<u8>, CryptoError> {
    use x509_parser::prelude::*;

    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| CryptoError::InvalidCertificate(format!("failed to parse: {e}")))?;

    // The BIT STRING payload of SubjectPublicKeyInfo is the RSAPublicKey
    // structure the verifier expects.
    Ok(cert.public_key().subject_public_key.data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_returns_credentials_in_insertion_order() {
        let mut store = InMemorySigningKeyStore::new();
        store.add(VerificationCredential::new("https://idp.example.com", vec![1]));
        store.add(VerificationCredential::new("https://idp.example.com", vec![2]));
        store.add(VerificationCredential::new("https://msa.example.com", vec![3]));

        let creds = store.credentials_for("https://idp.example.com");
        assert_eq!(creds.len(), 2);
        assert_eq!(creds[0].public_key(), &[1]);
        assert_eq!(creds[1].public_key(), &[2]);
    }

    #[test]
    fn unknown_entity_resolves_to_empty_set() {
        let store = InMemorySigningKeyStore::new();
        assert!(store.credentials_for("https://unknown.example.com").is_empty());
    }

    #[test]
    fn debug_output_hides_key_material() {
        let cred = SigningCredential::new("https://hub.example.com", vec![0xAA; 32], None);
        let rendered = format!("{cred:?}");
        assert!(rendered.contains("hub.example.com"));
        assert!(!rendered.contains("170"));
    }
}
