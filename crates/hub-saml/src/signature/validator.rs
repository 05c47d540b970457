//! XML Signature validation.
//!
//! One engine serves both levels: message envelopes (Response/AuthnRequest)
//! and individual decrypted assertions. The claimed issuer's credential set
//! is resolved from the signing-key store and tried in order, newest first,
//! so a signing-key rollover at the peer needs no downtime here.
//!
//! Three failure modes stay machine-distinguishable: no signature element,
//! a signature element with no signature value, and a signature that fails
//! digest or cryptographic verification.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hub_crypto::{SigningKeyStore, VerificationCredential};

use crate::error::{SamlResult, ValidationFailure};
use crate::parser::ParsedObject;
use crate::types::{Assertion, AuthnRequest, Response};
use crate::validated::{ValidatedAssertions, ValidatedMessage};

use super::signer::extract_element;
use super::{build_signed_info, canonicalize, SignatureAlgorithm, XmlSignature};

/// A message type whose envelope carries an enveloped signature.
pub trait SignedMessage {
    /// The message's unique ID.
    fn id(&self) -> &str;
    /// The claimed issuer entity ID.
    fn issuer(&self) -> &str;
}

impl SignedMessage for Response {
    fn id(&self) -> &str {
        &self.id
    }
    fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl SignedMessage for AuthnRequest {
    fn id(&self) -> &str {
        &self.id
    }
    fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl SignedMessage for Assertion {
    fn id(&self) -> &str {
        &self.id
    }
    fn issuer(&self) -> &str {
        &self.issuer
    }
}

/// Validates envelope signatures on top-level messages.
///
/// Stateless apart from the shared key store; safe to reuse across
/// concurrent requests.
#[derive(Clone)]
pub struct MessageSignatureValidator {
    key_store: Arc<dyn SigningKeyStore>,
}

impl MessageSignatureValidator {
    /// Creates a validator resolving credentials from the given store.
    #[must_use]
    pub fn new(key_store: Arc<dyn SigningKeyStore>) -> Self {
        Self { key_store }
    }

    /// Verifies the message's signature, consuming the parsed object and
    /// producing the proof-of-validation wrapper.
    pub fn validate<T: SignedMessage>(
        &self,
        parsed: ParsedObject<T>,
    ) -> SamlResult<ValidatedMessage<T>> {
        let credential =
            verify_against_issuer(parsed.xml(), parsed.object().issuer(), &*self.key_store)?;
        Ok(ValidatedMessage::new(parsed, credential))
    }
}

/// Validates signatures on individual decrypted assertions.
#[derive(Clone)]
pub struct AssertionSignatureValidator {
    key_store: Arc<dyn SigningKeyStore>,
}

impl AssertionSignatureValidator {
    /// Creates a validator resolving credentials from the given store.
    #[must_use]
    pub fn new(key_store: Arc<dyn SigningKeyStore>) -> Self {
        Self { key_store }
    }

    /// Verifies every assertion's signature, producing the validated set.
    pub fn validate(
        &self,
        parsed: Vec<ParsedObject<Assertion>>,
    ) -> SamlResult<ValidatedAssertions> {
        let mut assertions = Vec::with_capacity(parsed.len());
        let mut credentials = Vec::with_capacity(parsed.len());
        for item in parsed {
            let credential =
                verify_against_issuer(item.xml(), item.object().issuer(), &*self.key_store)?;
            let (assertion, _) = item.into_parts();
            assertions.push(assertion);
            credentials.push(credential);
        }
        Ok(ValidatedAssertions::new(assertions, credentials))
    }
}

/// The shared engine: extract the signature, check the digest, then try the
/// issuer's credentials in order until one verifies.
fn verify_against_issuer(
    xml: &str,
    issuer: &str,
    key_store: &dyn SigningKeyStore,
) -> SamlResult<VerificationCredential> {
    let signature = extract_signature(xml)?;
    verify_digest(xml, &signature)?;

    let credentials = key_store.credentials_for(issuer);
    if credentials.is_empty() {
        return Err(ValidationFailure::signature_invalid(format!(
            "no verification credentials configured for issuer {issuer}"
        )));
    }

    let signed_info = build_signed_info(
        &signature.reference_uri,
        &signature.digest_value,
        signature.algorithm,
    );
    let canonical_signed_info = canonicalize(&signed_info);
    let signature_bytes = STANDARD
        .decode(&signature.signature_value)
        .map_err(|e| {
            ValidationFailure::signature_invalid(format!("signature value is not base64: {e}"))
        })?;

    for (position, credential) in credentials.iter().enumerate() {
        let verified = hub_crypto::rsa_verify(
            credential.public_key(),
            canonical_signed_info.as_bytes(),
            &signature_bytes,
            signature.algorithm.rsa_algorithm(),
        )
        .unwrap_or(false);

        if verified {
            if position > 0 {
                tracing::debug!(issuer, position, "signature verified by rollover credential");
            }
            return Ok(credential.clone());
        }
        tracing::debug!(issuer, position, "credential did not verify signature");
    }

    Err(ValidationFailure::signature_invalid(format!(
        "signature from {issuer} did not verify against any trusted credential"
    )))
}

/// Extracts signature information from an XML document, distinguishing the
/// missing and unsigned cases from a verifiable-but-wrong signature.
fn extract_signature(xml: &str) -> SamlResult<XmlSignature> {
    if !xml.contains("<ds:Signature") && !xml.contains("<Signature") {
        return Err(ValidationFailure::signature_missing(
            "no Signature element found",
        ));
    }

    let signature_value = extract_element_content(xml, "SignatureValue")
        .map(|v| v.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .unwrap_or_default();
    if signature_value.is_empty() {
        return Err(ValidationFailure::signature_unsigned(
            "Signature element present but carries no signature value",
        ));
    }

    let algorithm = extract_attribute(xml, "SignatureMethod", "Algorithm")
        .and_then(|uri| SignatureAlgorithm::from_uri(&uri))
        .ok_or_else(|| {
            ValidationFailure::signature_invalid("missing or unsupported signature algorithm")
        })?;

    let reference_uri = extract_attribute(xml, "Reference", "URI")
        .ok_or_else(|| ValidationFailure::signature_invalid("no Reference URI found"))?;

    let digest_value = extract_element_content(xml, "DigestValue")
        .map(|v| v.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationFailure::signature_invalid("no DigestValue found"))?;

    Ok(XmlSignature {
        algorithm,
        reference_uri,
        digest_value,
        signature_value,
    })
}

/// Verifies the digest over the referenced element with the signature
/// element removed.
fn verify_digest(xml: &str, signature: &XmlSignature) -> SamlResult<()> {
    let reference_id = signature
        .reference_uri
        .strip_prefix('#')
        .unwrap_or(&signature.reference_uri);

    let element = extract_referenced_element(xml, reference_id)?;
    let element_without_sig = remove_signature_element(&element);

    let calculated = signature
        .algorithm
        .digest(canonicalize(&element_without_sig).as_bytes());
    let calculated_b64 = STANDARD.encode(&calculated);

    if calculated_b64 != signature.digest_value {
        return Err(ValidationFailure::signature_invalid(
            "digest value mismatch",
        ));
    }

    Ok(())
}

/// Extracts an attribute value from the first occurrence of an element.
fn extract_attribute(xml: &str, element: &str, attribute: &str) -> Option<String> {
    let patterns = [format!("<{element}"), format!("<ds:{element}")];

    for pattern in &patterns {
        if let Some(pos) = xml.find(pattern.as_str()) {
            let end = xml[pos..].find('>')?;
            let element_str = &xml[pos..pos + end];

            let attr_pattern = format!("{attribute}=\"");
            if let Some(attr_start) = element_str.find(&attr_pattern) {
                let value_start = attr_start + attr_pattern.len();
                let value_end = element_str[value_start..].find('"')?;
                return Some(element_str[value_start..value_start + value_end].to_string());
            }
        }
    }
    None
}

/// Extracts the text content of the first occurrence of an element.
fn extract_element_content(xml: &str, element: &str) -> Option<String> {
    let patterns = [
        (format!("<{element}>"), format!("</{element}>")),
        (format!("<ds:{element}>"), format!("</ds:{element}>")),
    ];

    for (open, close) in &patterns {
        if let Some(start) = xml.find(open.as_str()) {
            let content_start = start + open.len();
            if let Some(end) = xml[content_start..].find(close.as_str()) {
                return Some(xml[content_start..content_start + end].to_string());
            }
        }
    }
    None
}

/// Extracts the element carrying the referenced ID.
fn extract_referenced_element(xml: &str, reference_id: &str) -> SamlResult<String> {
    let id_pattern = format!("ID=\"{reference_id}\"");
    let pos = xml.find(&id_pattern).ok_or_else(|| {
        ValidationFailure::signature_invalid(format!(
            "referenced element '{reference_id}' not found"
        ))
    })?;

    let mut start = pos;
    while start > 0 && xml.as_bytes()[start - 1] != b'<' {
        start -= 1;
    }
    if start > 0 {
        start -= 1;
    }

    extract_element(xml, start)
}

/// Removes the first Signature element from XML content.
///
/// The envelope's own signature precedes any nested assertion signatures,
/// so first-match removal strips exactly the enveloped signature.
fn remove_signature_element(xml: &str) -> String {
    let patterns = [
        ("<ds:Signature", "</ds:Signature>"),
        ("<Signature", "</Signature>"),
    ];

    for (open, close) in &patterns {
        if let Some(start) = xml.find(open) {
            if let Some(end_offset) = xml[start..].find(close) {
                let end = start + end_offset + close.len();
                return format!("{}{}", &xml[..start], &xml[end..]);
            }
        }
    }
    xml.to_string()
}
