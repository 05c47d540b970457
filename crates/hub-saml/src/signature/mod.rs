//! XML Signature support.
//!
//! Signing and rollover-aware validation of XML-DSig signatures on SAML
//! messages and assertions. Only RSA PKCS#1 v1.5 with SHA-2 digests is
//! accepted; there is no SHA-1 compatibility path.

mod signer;
mod validator;

pub use signer::*;
pub use validator::*;

use crate::types::{canonicalization_algorithms, digest_algorithms, signature_algorithms};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256 (federation default).
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
        }
    }

    /// Returns the corresponding digest algorithm URI.
    #[must_use]
    pub const fn digest_uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => digest_algorithms::SHA256,
            Self::RsaSha384 => digest_algorithms::SHA384,
            Self::RsaSha512 => digest_algorithms::SHA512,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            _ => None,
        }
    }

    /// The hub-crypto algorithm this maps onto.
    #[must_use]
    pub(crate) const fn rsa_algorithm(&self) -> hub_crypto::RsaAlgorithm {
        match self {
            Self::RsaSha256 => hub_crypto::RsaAlgorithm::Sha256,
            Self::RsaSha384 => hub_crypto::RsaAlgorithm::Sha384,
            Self::RsaSha512 => hub_crypto::RsaAlgorithm::Sha512,
        }
    }

    /// Computes this algorithm's digest of the data.
    pub(crate) fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::RsaSha256 => hub_crypto::sha256(data),
            Self::RsaSha384 => hub_crypto::sha384(data),
            Self::RsaSha512 => hub_crypto::sha512(data),
        }
    }
}

/// Extracted `<ds:Signature>` contents.
#[derive(Debug, Clone)]
pub struct XmlSignature {
    /// The signature algorithm used.
    pub algorithm: SignatureAlgorithm,
    /// The reference URI (typically `#` plus the signed element's ID).
    pub reference_uri: String,
    /// The digest value (base64 encoded).
    pub digest_value: String,
    /// The signature value (base64 encoded).
    pub signature_value: String,
}

/// Builds the SignedInfo element.
///
/// Shared between signing and verification so both sides canonicalize the
/// same bytes.
pub(crate) fn build_signed_info(
    reference_uri: &str,
    digest_b64: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    format!(
        r##"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
<ds:CanonicalizationMethod Algorithm="{c14n}"/>
<ds:SignatureMethod Algorithm="{sig}"/>
<ds:Reference URI="{reference_uri}">
<ds:Transforms>
<ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/>
<ds:Transform Algorithm="{c14n}"/>
</ds:Transforms>
<ds:DigestMethod Algorithm="{digest}"/>
<ds:DigestValue>{digest_b64}</ds:DigestValue>
</ds:Reference>
</ds:SignedInfo>"##,
        c14n = canonicalization_algorithms::EXCLUSIVE_C14N,
        sig = algorithm.uri(),
        digest = algorithm.digest_uri(),
    )
}

/// Normalizes XML whitespace (simplified canonicalization).
pub(crate) fn canonicalize(xml: &str) -> String {
    xml.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_algorithm_uri_roundtrip() {
        for alg in [
            SignatureAlgorithm::RsaSha256,
            SignatureAlgorithm::RsaSha384,
            SignatureAlgorithm::RsaSha512,
        ] {
            assert_eq!(SignatureAlgorithm::from_uri(alg.uri()), Some(alg));
        }
        assert_eq!(
            SignatureAlgorithm::from_uri("http://www.w3.org/2000/09/xmldsig#rsa-sha1"),
            None
        );
    }

    #[test]
    fn canonicalize_normalizes_whitespace() {
        let input = "  <element>   content   </element>  ";
        assert_eq!(canonicalize(input), "<element> content </element>");
    }

    #[test]
    fn signed_info_embeds_reference_and_digest() {
        let signed_info = build_signed_info("#_id1", "ZGlnZXN0", SignatureAlgorithm::RsaSha256);
        assert!(signed_info.contains(r##"URI="#_id1""##));
        assert!(signed_info.contains("ZGlnZXN0"));
        assert!(signed_info.contains("rsa-sha256"));
    }
}
