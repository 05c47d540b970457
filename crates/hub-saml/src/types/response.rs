//! SAML Response types.
//!
//! Hub profiles only accept assertions through the decrypter chain, so the
//! inbound response shape carries encrypted assertions; decrypted assertions
//! exist only inside [`crate::validated::ValidatedAssertions`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Status;

/// SAML Response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier for this response.
    pub id: String,

    /// Timestamp when this response was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the issuer.
    pub issuer: String,

    /// The ID of the request this response answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// The URL where this response was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The status of the response.
    pub status: Status,

    /// Encrypted assertions in this response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted_assertions: Vec<EncryptedAssertion>,
}

impl Response {
    /// Creates a new success response.
    #[must_use]
    pub fn success(issuer: impl Into<String>) -> Self {
        Self::with_status(issuer, Status::success())
    }

    /// Creates a new response with the given status.
    #[must_use]
    pub fn with_status(issuer: impl Into<String>, status: Status) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            in_response_to: None,
            destination: None,
            status,
            encrypted_assertions: Vec::new(),
        }
    }

    /// Sets the request ID this response answers.
    #[must_use]
    pub fn in_response_to(mut self, request_id: impl Into<String>) -> Self {
        self.in_response_to = Some(request_id.into());
        self
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Returns true if the top-level status is Success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// An encrypted assertion as found on the wire.
///
/// Algorithms are kept as declared so the allow-list check can run before
/// any decryption output is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedAssertion {
    /// Content-encryption algorithm URI declared on the EncryptedData.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_algorithm: Option<String>,

    /// Key-transport algorithm URI declared on the EncryptedKey.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_algorithm: Option<String>,

    /// The wrapped content key, base64-encoded.
    pub encrypted_key: String,

    /// The encrypted assertion content, base64-encoded.
    pub cipher_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_success() {
        let response = Response::success("https://idp.example.com")
            .in_response_to("_req123")
            .with_destination("https://hub.example.com/acs");

        assert!(response.is_success());
        assert!(!response.id.is_empty());
        assert_eq!(response.in_response_to.as_deref(), Some("_req123"));
        assert!(response.encrypted_assertions.is_empty());
    }
}
