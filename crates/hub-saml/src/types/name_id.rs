//! SAML Name ID types.

use serde::{Deserialize, Serialize};

use super::NameIdFormat;

/// SAML Name ID.
///
/// Identifies a subject (or, with the `entity` format, an issuer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The actual identifier value.
    pub value: String,

    /// The format URI of the name identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl NameId {
    /// Creates a new name ID with the given value and no format.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
        }
    }

    /// Creates a persistent name ID.
    #[must_use]
    pub fn persistent(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Persistent)
    }

    /// Creates a transient name ID.
    #[must_use]
    pub fn transient(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Transient)
    }

    /// Sets the format for this name ID.
    #[must_use]
    pub fn with_format(mut self, format: NameIdFormat) -> Self {
        self.format = Some(format.uri().to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistent_name_id_carries_format() {
        let name_id = NameId::persistent("_pid123");
        assert_eq!(name_id.value, "_pid123");
        assert_eq!(name_id.format.as_deref(), Some(NameIdFormat::Persistent.uri()));
    }
}
