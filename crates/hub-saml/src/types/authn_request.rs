//! SAML AuthnRequest types.

use chrono::{DateTime, Utc};
use hub_core::LevelOfAssurance;
use serde::{Deserialize, Serialize};

/// SAML Authentication Request.
///
/// Received from relying parties, and originated by the hub toward identity
/// providers with a requested level of assurance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Unique identifier for this request.
    pub id: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the issuer.
    pub issuer: String,

    /// The URL this request was addressed to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Whether the identity provider must re-authenticate the user.
    #[serde(default)]
    pub force_authn: bool,

    /// The minimum level of assurance requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_level: Option<LevelOfAssurance>,
}

impl AuthnRequest {
    /// Creates a new authentication request.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            destination: None,
            force_authn: false,
            requested_level: None,
        }
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Requests re-authentication.
    #[must_use]
    pub const fn with_force_authn(mut self) -> Self {
        self.force_authn = true;
        self
    }

    /// Sets the requested level of assurance.
    #[must_use]
    pub const fn with_requested_level(mut self, level: LevelOfAssurance) -> Self {
        self.requested_level = Some(level);
        self
    }
}
