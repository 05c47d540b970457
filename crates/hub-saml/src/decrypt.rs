//! Multi-key assertion decryption.
//!
//! The hub holds an ordered list of decrypting credentials (current key
//! first, then predecessors). One decrypter must serve *every* encrypted
//! assertion in a response: the chain tries each credential against the
//! whole set and uses the first that succeeds. Mixed-key assertions within
//! a single response are not supported during rollover.
//!
//! Declared algorithms are checked against an allow-list before any
//! decrypted content is accepted, even when decryption would succeed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hub_crypto::xmlenc::{self, OaepDigest};
use hub_crypto::{DecryptingCredential, DecryptionKeyStore};

use crate::error::{SamlResult, ValidationFailure};
use crate::types::{encryption_algorithms, EncryptedAssertion, Response};
use crate::validated::ValidatedMessage;

const ALLOWED_CONTENT_ALGORITHMS: &[&str] = &[
    encryption_algorithms::AES128_GCM,
    encryption_algorithms::AES256_GCM,
];

fn oaep_digest_for(key_algorithm: &str) -> Option<OaepDigest> {
    match key_algorithm {
        encryption_algorithms::RSA_OAEP_MGF1P => Some(OaepDigest::Sha1),
        encryption_algorithms::RSA_OAEP => Some(OaepDigest::Sha256),
        _ => None,
    }
}

/// Rejects encrypted assertions declaring weak or unknown algorithms.
pub fn check_algorithms(encrypted: &EncryptedAssertion) -> SamlResult<()> {
    let content = encrypted.content_algorithm.as_deref().ok_or_else(|| {
        ValidationFailure::decryption("encrypted assertion declares no content algorithm")
    })?;
    if !ALLOWED_CONTENT_ALGORITHMS.contains(&content) {
        return Err(ValidationFailure::decryption(format!(
            "content-encryption algorithm is not allowed: {content}"
        )));
    }

    let key = encrypted.key_algorithm.as_deref().ok_or_else(|| {
        ValidationFailure::decryption("encrypted assertion declares no key-transport algorithm")
    })?;
    if oaep_digest_for(key).is_none() {
        return Err(ValidationFailure::decryption(format!(
            "key-transport algorithm is not allowed: {key}"
        )));
    }

    Ok(())
}

/// Decrypts one encrypted assertion with one credential.
fn decrypt_one(
    credential: &DecryptingCredential,
    encrypted: &EncryptedAssertion,
) -> SamlResult<String> {
    // check_algorithms ran first, so the digest lookup cannot miss here.
    let digest = encrypted
        .key_algorithm
        .as_deref()
        .and_then(oaep_digest_for)
        .ok_or_else(|| ValidationFailure::decryption("key-transport algorithm not allowed"))?;

    let wrapped = STANDARD.decode(&encrypted.encrypted_key)?;
    let content_key = xmlenc::unwrap_key(credential.key(), &wrapped, digest)
        .map_err(|e| ValidationFailure::decryption(e.to_string()).with_cause(e))?;

    let blob = STANDARD.decode(&encrypted.cipher_value)?;
    let plaintext = xmlenc::open(&content_key, &blob)
        .map_err(|e| ValidationFailure::decryption(e.to_string()).with_cause(e))?;

    String::from_utf8(plaintext)
        .map_err(|e| ValidationFailure::decryption(format!("decrypted content is not UTF-8: {e}")))
}

/// Ordered try-sequence over the hub's decrypting credentials.
pub struct DecrypterChain {
    credentials: Vec<DecryptingCredential>,
}

impl DecrypterChain {
    /// Creates a chain over an ordered credential list, current key first.
    #[must_use]
    pub fn new(credentials: Vec<DecryptingCredential>) -> Self {
        Self { credentials }
    }

    /// Creates a chain from the decryption-key store.
    #[must_use]
    pub fn from_store(store: &dyn DecryptionKeyStore) -> Self {
        Self::new(store.decrypting_credentials())
    }

    /// Decrypts every encrypted assertion in the validated response.
    ///
    /// Returns the decrypted assertion documents in wire order. If no
    /// credential decrypts the whole set, one aggregated failure is raised;
    /// per-credential detail stays internal at DEBUG.
    pub fn decrypt_assertions(
        &self,
        message: &ValidatedMessage<Response>,
    ) -> SamlResult<Vec<String>> {
        let encrypted = &message.message().encrypted_assertions;
        if encrypted.is_empty() {
            return Ok(Vec::new());
        }

        for assertion in encrypted {
            check_algorithms(assertion)?;
        }

        if self.credentials.is_empty() {
            return Err(ValidationFailure::decryption(
                "no decryption keys are configured",
            ));
        }

        for (position, credential) in self.credentials.iter().enumerate() {
            match self.try_credential(credential, encrypted) {
                Ok(decrypted) => {
                    if position > 0 {
                        tracing::debug!(position, "response decrypted by rollover key");
                    }
                    return Ok(decrypted);
                }
                Err(failure) => {
                    tracing::debug!(position, %failure, "decryption key did not fit");
                }
            }
        }

        Err(ValidationFailure::decryption(
            "no configured decryption key could decrypt the response",
        ))
    }

    /// Tries one credential against the whole encrypted set.
    fn try_credential(
        &self,
        credential: &DecryptingCredential,
        encrypted: &[EncryptedAssertion],
    ) -> SamlResult<Vec<String>> {
        encrypted
            .iter()
            .map(|assertion| decrypt_one(credential, assertion))
            .collect()
    }
}
