//! Outbound message construction.
//!
//! Stages are strictly ordered: marshal → sign each assertion → encrypt
//! each assertion (or pass through) → sign the envelope → base64. Assertions
//! are signed *before* encryption; the stage order is fixed by construction
//! and cannot be reordered by callers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hub_crypto::{xmlenc, EncryptionCredential, SigningCredential};

use crate::error::{SamlResult, ValidationFailure};
use crate::marshal::{
    marshal_assertion, marshal_authn_request, marshal_encrypted_assertion, marshal_response,
    StatusVocabulary,
};
use crate::signature::XmlSigner;
use crate::types::{encryption_algorithms, Assertion, AuthnRequest, Response};

/// A wire-ready outbound message.
#[derive(Debug, Clone)]
pub struct SamlEnvelope {
    /// The signed (and possibly encrypted) document, base64-encoded.
    pub message: String,
    /// Where the HTTP-binding layer should deliver it.
    pub destination: String,
    /// Caller-supplied value round-tripped through the exchange.
    pub relay_state: Option<String>,
}

/// Per-assertion encryption strategy, selected at construction time.
///
/// Health-check attribute queries have no encrypting recipient and use the
/// pass-through strategy; everything else wraps a fresh content key to the
/// recipient.
pub enum AssertionEncrypter {
    /// Embed signed assertions in the clear.
    Noop,
    /// Encrypt each signed assertion to the recipient.
    Rsa(EncryptionCredential),
}

impl AssertionEncrypter {
    /// Applies the strategy to one signed assertion document.
    pub fn encrypt(&self, signed_assertion_xml: &str) -> SamlResult<String> {
        match self {
            Self::Noop => Ok(signed_assertion_xml.to_string()),
            Self::Rsa(recipient) => {
                let content_key = xmlenc::generate_content_key();
                let wrapped =
                    xmlenc::wrap_key(recipient.key(), &content_key, xmlenc::OaepDigest::Sha1)
                        .map_err(|e| ValidationFailure::decryption(e.to_string()).with_cause(e))?;
                let sealed = xmlenc::seal(&content_key, signed_assertion_xml.as_bytes())
                    .map_err(|e| ValidationFailure::decryption(e.to_string()).with_cause(e))?;

                Ok(marshal_encrypted_assertion(
                    encryption_algorithms::AES256_GCM,
                    encryption_algorithms::RSA_OAEP_MGF1P,
                    &STANDARD.encode(wrapped),
                    &STANDARD.encode(sealed),
                ))
            }
        }
    }
}

/// Builds signed responses, optionally encrypting assertions to a recipient.
pub struct OutboundResponseBuilder {
    signer: XmlSigner,
    encrypter: AssertionEncrypter,
    vocabulary: StatusVocabulary,
}

impl OutboundResponseBuilder {
    /// Creates a builder with the hub's signing key, the encryption
    /// strategy and the status vocabulary for this transaction.
    #[must_use]
    pub fn new(
        signing: SigningCredential,
        encrypter: AssertionEncrypter,
        vocabulary: StatusVocabulary,
    ) -> Self {
        Self {
            signer: XmlSigner::new(signing),
            encrypter,
            vocabulary,
        }
    }

    /// Runs the full outbound pipeline for one response.
    pub fn build(
        &self,
        response: &Response,
        assertions: &[Assertion],
        relay_state: Option<String>,
    ) -> SamlResult<SamlEnvelope> {
        let destination = response
            .destination
            .clone()
            .ok_or_else(|| ValidationFailure::missing_field("Response Destination"))?;

        let mut blocks = Vec::with_capacity(assertions.len());
        for assertion in assertions {
            let xml = marshal_assertion(assertion);
            let signed = self.signer.sign(&xml, &assertion.id)?;
            blocks.push(self.encrypter.encrypt(&signed)?);
        }

        let envelope = marshal_response(response, &blocks, self.vocabulary);
        let signed_envelope = self.signer.sign(&envelope, &response.id)?;

        Ok(SamlEnvelope {
            message: STANDARD.encode(signed_envelope),
            destination,
            relay_state,
        })
    }
}

/// Builds signed authentication requests toward identity providers.
pub struct OutboundAuthnRequestBuilder {
    signer: XmlSigner,
}

impl OutboundAuthnRequestBuilder {
    /// Creates a builder with the hub's signing key.
    #[must_use]
    pub fn new(signing: SigningCredential) -> Self {
        Self {
            signer: XmlSigner::new(signing),
        }
    }

    /// Marshals, signs and encodes one request.
    pub fn build(
        &self,
        request: &AuthnRequest,
        relay_state: Option<String>,
    ) -> SamlResult<SamlEnvelope> {
        let destination = request
            .destination
            .clone()
            .ok_or_else(|| ValidationFailure::missing_field("AuthnRequest Destination"))?;

        let xml = marshal_authn_request(request);
        let signed = self.signer.sign(&xml, &request.id)?;

        Ok(SamlEnvelope {
            message: STANDARD.encode(signed),
            destination,
            relay_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_encrypter_passes_through() {
        let xml = "<saml:Assertion ID=\"_a\"/>";
        let out = AssertionEncrypter::Noop.encrypt(xml).unwrap();
        assert_eq!(out, xml);
    }

    #[test]
    fn response_without_destination_is_rejected() {
        let response = Response::success("https://hub.example.com");
        let builder = OutboundResponseBuilder::new(
            SigningCredential::new("https://hub.example.com", vec![0u8; 8], None),
            AssertionEncrypter::Noop,
            StatusVocabulary::Hub,
        );
        let err = builder.build(&response, &[], None).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::MissingField);
    }
}
