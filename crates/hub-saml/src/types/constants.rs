//! SAML 2.0 constants and URIs.
//!
//! Namespace URIs, status vocabularies, name ID formats, algorithm URIs and
//! the hub's own sub-status and level-of-assurance vocabularies.

use hub_core::LevelOfAssurance;

/// SAML 2.0 assertion namespace URI.
pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 protocol namespace URI.
pub const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// XML Digital Signature namespace URI.
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML Encryption namespace URI.
pub const XMLENC_NS: &str = "http://www.w3.org/2001/04/xmlenc#";

// ============================================================================
// Status Codes
// ============================================================================

/// Top-level SAML status codes.
pub mod status_codes {
    /// Success status code.
    pub const SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

    /// Requester error status code.
    pub const REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";

    /// Responder error status code.
    pub const RESPONDER: &str = "urn:oasis:names:tc:SAML:2.0:status:Responder";
}

/// Second-level SAML status codes from the core specification.
pub mod sub_status_codes {
    /// Authentication failed.
    pub const AUTHN_FAILED: &str = "urn:oasis:names:tc:SAML:2.0:status:AuthnFailed";

    /// No authentication context could be satisfied.
    pub const NO_AUTHN_CONTEXT: &str = "urn:oasis:names:tc:SAML:2.0:status:NoAuthnContext";

    /// Request denied.
    pub const REQUEST_DENIED: &str = "urn:oasis:names:tc:SAML:2.0:status:RequestDenied";
}

/// The hub's own sub-status vocabulary.
///
/// Carried as second-level status codes under the standard top-level codes;
/// peers outside the federation never see these (the legacy status
/// marshaller strips them).
pub mod hub_status_codes {
    /// Matching service matched the identity to exactly one record.
    pub const MATCH: &str = "urn:hub:identity-federation:status:match";

    /// Matching service found no matching record.
    pub const NO_MATCH: &str = "urn:hub:identity-federation:status:no-match";

    /// Matching service found more than one candidate record.
    pub const MULTI_MATCH: &str = "urn:hub:identity-federation:status:multi-match";

    /// Matching service created a new record.
    pub const CREATED: &str = "urn:hub:identity-federation:status:created";

    /// Matching service failed to create a record.
    pub const CREATE_FAILURE: &str = "urn:hub:identity-federation:status:create-failure";

    /// Health-check responder is healthy.
    pub const HEALTHY: &str = "urn:hub:identity-federation:status:healthy";

    /// The user cancelled authentication at the identity provider.
    pub const AUTHN_CANCEL: &str = "urn:hub:identity-federation:status:authn-cancel";

    /// Authentication is pending at the identity provider.
    pub const AUTHN_PENDING: &str = "urn:hub:identity-federation:status:authn-pending";

    /// The identity provider could not uplift the user's assurance level.
    pub const UPLIFT_FAILED: &str = "urn:hub:identity-federation:status:uplift-failed";
}

// ============================================================================
// Name ID Formats
// ============================================================================

/// SAML Name ID formats used across the federation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameIdFormat {
    /// Unspecified name ID format.
    #[default]
    Unspecified,
    /// Entity identifier format, required on issuers.
    Entity,
    /// Persistent identifier format.
    Persistent,
    /// Transient identifier format.
    Transient,
}

impl NameIdFormat {
    /// Returns the URI for this name ID format.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Unspecified => "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified",
            Self::Entity => "urn:oasis:names:tc:SAML:2.0:nameid-format:entity",
            Self::Persistent => "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent",
            Self::Transient => "urn:oasis:names:tc:SAML:2.0:nameid-format:transient",
        }
    }

    /// Parses a name ID format from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified" => Some(Self::Unspecified),
            "urn:oasis:names:tc:SAML:2.0:nameid-format:entity" => Some(Self::Entity),
            "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent" => Some(Self::Persistent),
            "urn:oasis:names:tc:SAML:2.0:nameid-format:transient" => Some(Self::Transient),
            _ => None,
        }
    }
}

// ============================================================================
// Levels of Assurance
// ============================================================================

/// URI for the basic level of assurance.
pub const LOA_LEVEL_1: &str = "urn:hub:identity-federation:loa:level-1";

/// URI for the substantial level of assurance.
pub const LOA_LEVEL_2: &str = "urn:hub:identity-federation:loa:level-2";

/// Returns the AuthnContext class-ref URI for a level of assurance.
#[must_use]
pub const fn level_of_assurance_uri(level: LevelOfAssurance) -> &'static str {
    match level {
        LevelOfAssurance::Level1 => LOA_LEVEL_1,
        LevelOfAssurance::Level2 => LOA_LEVEL_2,
    }
}

/// Parses a level of assurance from its AuthnContext class-ref URI.
#[must_use]
pub fn level_of_assurance_from_uri(uri: &str) -> Option<LevelOfAssurance> {
    match uri {
        LOA_LEVEL_1 => Some(LevelOfAssurance::Level1),
        LOA_LEVEL_2 => Some(LevelOfAssurance::Level2),
        _ => None,
    }
}

// ============================================================================
// Signature Algorithms
// ============================================================================

/// XML signature algorithms.
pub mod signature_algorithms {
    /// RSA-SHA256 signature algorithm.
    pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

    /// RSA-SHA384 signature algorithm.
    pub const RSA_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384";

    /// RSA-SHA512 signature algorithm.
    pub const RSA_SHA512: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512";
}

/// Digest algorithms.
pub mod digest_algorithms {
    /// SHA-256 digest algorithm.
    pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

    /// SHA-384 digest algorithm.
    pub const SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#sha384";

    /// SHA-512 digest algorithm.
    pub const SHA512: &str = "http://www.w3.org/2001/04/xmlenc#sha512";
}

/// Canonicalization algorithms.
pub mod canonicalization_algorithms {
    /// Exclusive C14N without comments.
    pub const EXCLUSIVE_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
}

// ============================================================================
// Encryption Algorithms
// ============================================================================

/// XML encryption algorithms, allowed and known-disallowed.
pub mod encryption_algorithms {
    /// AES-128 in GCM mode (allowed).
    pub const AES128_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes128-gcm";

    /// AES-256 in GCM mode (allowed).
    pub const AES256_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes256-gcm";

    /// RSA-OAEP key transport with an SHA-1 mask digest (allowed).
    pub const RSA_OAEP_MGF1P: &str = "http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p";

    /// XML-Enc 1.1 RSA-OAEP key transport, SHA-256 mask digest (allowed).
    pub const RSA_OAEP: &str = "http://www.w3.org/2009/xmlenc11#rsa-oaep";

    /// AES-128 in CBC mode (disallowed: malleable).
    pub const AES128_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes128-cbc";

    /// AES-256 in CBC mode (disallowed: malleable).
    pub const AES256_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes256-cbc";

    /// RSA PKCS#1 v1.5 key transport (disallowed: padding-oracle prone).
    pub const RSA_1_5: &str = "http://www.w3.org/2001/04/xmlenc#rsa-1_5";

    /// Triple-DES in CBC mode (disallowed: obsolete).
    pub const TRIPLEDES_CBC: &str = "http://www.w3.org/2001/04/xmlenc#tripledes-cbc";
}
