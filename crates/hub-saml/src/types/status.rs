//! SAML Status types.
//!
//! Status information returned in SAML protocol responses. Which pairs of
//! top-level and second-level codes a profile accepts is the status
//! grammar's concern ([`crate::status_mapper`]); these types only model the
//! wire shape.

use serde::{Deserialize, Serialize};

use super::status_codes;

/// SAML protocol status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// The status code, possibly nested.
    pub status_code: StatusCode,

    /// Optional status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl Status {
    /// Creates a status from a top-level code.
    #[must_use]
    pub fn new(code: StatusCode) -> Self {
        Self {
            status_code: code,
            status_message: None,
        }
    }

    /// Creates a plain success status.
    #[must_use]
    pub fn success() -> Self {
        Self::new(StatusCode::success())
    }

    /// Returns true if the top-level code is Success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }

    /// Sets the status message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

/// SAML status code.
///
/// Status codes can be nested, with a top-level code and optional sub-code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode {
    /// The status code URI value.
    pub value: String,

    /// Optional nested status code providing more detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Box<StatusCode>>,
}

impl StatusCode {
    /// Creates a new status code with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status_code: None,
        }
    }

    /// Creates a success status code.
    #[must_use]
    pub fn success() -> Self {
        Self::new(status_codes::SUCCESS)
    }

    /// Creates a requester error status code.
    #[must_use]
    pub fn requester() -> Self {
        Self::new(status_codes::REQUESTER)
    }

    /// Creates a responder error status code.
    #[must_use]
    pub fn responder() -> Self {
        Self::new(status_codes::RESPONDER)
    }

    /// Adds a sub-status code.
    #[must_use]
    pub fn with_sub_status(mut self, sub: StatusCode) -> Self {
        self.status_code = Some(Box::new(sub));
        self
    }

    /// Returns true if this is a success status code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.value == status_codes::SUCCESS
    }

    /// Returns the sub-status code value if present.
    #[must_use]
    pub fn sub_status_value(&self) -> Option<&str> {
        self.status_code.as_ref().map(|s| s.value.as_str())
    }
}
