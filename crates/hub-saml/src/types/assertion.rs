//! SAML Assertion types.
//!
//! Assertions contain statements about a subject made by an issuer. In this
//! federation an identity-provider response carries two assertions with
//! distinct roles: one bearing the matching dataset (attributes only) and
//! one bearing the authentication statement. The roles matter because each
//! is replay-tracked in its own category.

use chrono::{DateTime, Utc};
use hub_core::LevelOfAssurance;
use serde::{Deserialize, Serialize};

use super::{level_of_assurance_from_uri, NameId};

/// SAML Assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier for this assertion.
    pub id: String,

    /// Timestamp when this assertion was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the issuer.
    pub issuer: String,

    /// Format URI declared on the Issuer element, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_format: Option<String>,

    /// The subject of this assertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// Conditions that bound the assertion's validity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Authentication statement describing how the subject authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authn_statement: Option<AuthnStatement>,

    /// Attribute statement containing attributes about the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_statement: Option<AttributeStatement>,
}

/// The role an assertion plays inside a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionRole {
    /// Carries the matching dataset (attribute statement, no authn).
    MatchingDataset,
    /// Carries the authentication statement.
    AuthnStatement,
}

impl Assertion {
    /// Creates a new assertion.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            issuer_format: None,
            subject: None,
            conditions: None,
            authn_statement: None,
            attribute_statement: None,
        }
    }

    /// Sets the issuer format URI.
    #[must_use]
    pub fn with_issuer_format(mut self, format: impl Into<String>) -> Self {
        self.issuer_format = Some(format.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Sets the authentication statement.
    #[must_use]
    pub fn with_authn_statement(mut self, statement: AuthnStatement) -> Self {
        self.authn_statement = Some(statement);
        self
    }

    /// Sets the attribute statement.
    #[must_use]
    pub fn with_attribute_statement(mut self, statement: AttributeStatement) -> Self {
        self.attribute_statement = Some(statement);
        self
    }

    /// Classifies this assertion's role within its response.
    #[must_use]
    pub fn role(&self) -> AssertionRole {
        if self.authn_statement.is_some() {
            AssertionRole::AuthnStatement
        } else {
            AssertionRole::MatchingDataset
        }
    }

    /// The achieved level of assurance, parsed from the AuthnContext
    /// class-ref. `None` when no statement or context is present, or when
    /// the class-ref is not a known level.
    #[must_use]
    pub fn level_of_assurance(&self) -> Option<LevelOfAssurance> {
        self.authn_statement
            .as_ref()
            .and_then(|s| s.authn_context.as_ref())
            .and_then(|c| c.class_ref.as_deref())
            .and_then(level_of_assurance_from_uri)
    }
}

/// Subject of an assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// The name identifier for the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// Subject confirmations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_confirmations: Vec<SubjectConfirmation>,
}

impl Subject {
    /// Creates a new subject with a name ID.
    #[must_use]
    pub fn new(name_id: NameId) -> Self {
        Self {
            name_id: Some(name_id),
            subject_confirmations: Vec::new(),
        }
    }

    /// Adds a subject confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: SubjectConfirmation) -> Self {
        self.subject_confirmations.push(confirmation);
        self
    }
}

/// Subject confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectConfirmation {
    /// The confirmation method URI.
    pub method: String,

    /// Additional confirmation data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    /// Bearer confirmation method URI.
    pub const BEARER: &'static str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";

    /// Creates a bearer confirmation.
    #[must_use]
    pub fn bearer() -> Self {
        Self {
            method: Self::BEARER.to_string(),
            data: None,
        }
    }

    /// Sets the confirmation data.
    #[must_use]
    pub fn with_data(mut self, data: SubjectConfirmationData) -> Self {
        self.data = Some(data);
        self
    }
}

/// Subject confirmation data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectConfirmationData {
    /// The request ID that this assertion responds to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Time after which the subject can no longer be confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// The location to which the assertion can be presented.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    /// IP address of the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Conditions for assertion validity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conditions {
    /// Time before which the assertion is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Time at or after which the assertion is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Audiences the assertion is restricted to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audiences: Vec<String>,
}

impl Conditions {
    /// Creates conditions valid from now for the given number of minutes.
    #[must_use]
    pub fn with_validity(validity_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            not_before: Some(now),
            not_on_or_after: Some(now + chrono::Duration::minutes(validity_minutes)),
            audiences: Vec::new(),
        }
    }

    /// Adds an audience restriction.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audiences.push(audience.into());
        self
    }
}

/// Authentication statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnStatement {
    /// The time of authentication.
    pub authn_instant: DateTime<Utc>,

    /// The authentication context. Optional on the wire; its absence is a
    /// distinct validation failure from a missing statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authn_context: Option<AuthnContext>,
}

impl AuthnStatement {
    /// Creates an authentication statement for an achieved level.
    #[must_use]
    pub fn at_level(level: LevelOfAssurance) -> Self {
        Self {
            authn_instant: Utc::now(),
            authn_context: Some(AuthnContext::for_level(level)),
        }
    }
}

/// Authentication context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnContext {
    /// Authentication context class reference URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<String>,
}

impl AuthnContext {
    /// Creates a context carrying the class-ref for a level of assurance.
    #[must_use]
    pub fn for_level(level: LevelOfAssurance) -> Self {
        Self {
            class_ref: Some(super::level_of_assurance_uri(level).to_string()),
        }
    }
}

/// Attribute statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// List of attributes.
    pub attributes: Vec<Attribute>,
}

impl AttributeStatement {
    /// Creates a new empty attribute statement.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Returns the first value of the named attribute, if present.
    #[must_use]
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.values.first())
            .map(String::as_str)
    }
}

/// SAML Attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,

    /// The attribute values.
    pub values: Vec<String>,
}

impl Attribute {
    /// Name of the attribute carrying the client IP address observed by the
    /// identity provider.
    pub const IP_ADDRESS: &'static str = "IPAddress";

    /// Creates a new attribute with a single value.
    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Creates a new attribute with multiple values.
    #[must_use]
    pub fn multi(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}
