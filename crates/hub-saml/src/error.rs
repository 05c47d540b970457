//! Validation failure types.
//!
//! Every failure carries a machine-readable kind, a human-readable message
//! and a suggested log severity. Validators fail fast: the first failing
//! rule for a given input is returned, never a merged set.

use std::fmt;

use thiserror::Error;

/// Result type for pipeline operations.
pub type SamlResult<T> = Result<T, ValidationFailure>;

/// Machine-readable failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Input was not valid base64/UTF-8/XML or not the declared SAML type.
    MalformedInput,
    /// Input exceeded the byte ceiling for its message class.
    SizeExceeded,
    /// A required field (id, issuer, status, ...) was absent.
    MissingField,
    /// A field was present but unparseable (bad instant, unknown enum).
    IllegalValue,
    /// Signature missing, unsigned or cryptographically invalid.
    SignatureFailure(SignatureFailureKind),
    /// No usable decryption key, or a disallowed algorithm was declared.
    DecryptionFailure,
    /// A message or assertion ID was seen before within its window.
    ReplayDetected,
    /// A status/sub-status pair outside the profile's closed grammar.
    StatusGrammarViolation,
    /// Wrong number of assertions for the profile.
    AssertionCountViolation,
    /// A profile business rule failed (IP mismatch, missing AuthnContext).
    BusinessRuleViolation,
}

/// The three distinguishable signature failure modes.
///
/// Callers log and audit these differently, so they stay machine-separable
/// rather than collapsing into one message string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureFailureKind {
    /// No signature element at all.
    Missing,
    /// Signature element present but carries no signature value.
    Unsigned,
    /// Signature present but fails digest or cryptographic verification.
    Invalid,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MalformedInput => "malformed input",
            Self::SizeExceeded => "size exceeded",
            Self::MissingField => "missing field",
            Self::IllegalValue => "illegal value",
            Self::SignatureFailure(SignatureFailureKind::Missing) => {
                "signature failure (missing signature)"
            }
            Self::SignatureFailure(SignatureFailureKind::Unsigned) => {
                "signature failure (unsigned)"
            }
            Self::SignatureFailure(SignatureFailureKind::Invalid) => {
                "signature failure (invalid)"
            }
            Self::DecryptionFailure => "decryption failure",
            Self::ReplayDetected => "replay detected",
            Self::StatusGrammarViolation => "status grammar violation",
            Self::AssertionCountViolation => "assertion count violation",
            Self::BusinessRuleViolation => "business rule violation",
        };
        f.write_str(name)
    }
}

/// Suggested log severity for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Expected, benign input defects.
    Debug,
    /// Recoverable or configuration-shaped issues.
    Warn,
    /// Failures that may indicate an attack.
    Error,
}

impl Severity {
    /// Returns the conventional log-level name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// A single validation failure.
///
/// Immutable once constructed; constructors fix the severity per kind and
/// callers may not downgrade it.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct ValidationFailure {
    kind: FailureKind,
    message: String,
    severity: Severity,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ValidationFailure {
    fn new(kind: FailureKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity,
            cause: None,
        }
    }

    /// Input was not decodable or not the declared SAML type.
    #[must_use]
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedInput, Severity::Debug, message)
    }

    /// Input exceeded its class's byte ceiling.
    #[must_use]
    pub fn size_exceeded(message: impl Into<String>) -> Self {
        Self::new(FailureKind::SizeExceeded, Severity::Debug, message)
    }

    /// A required field was absent.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            FailureKind::MissingField,
            Severity::Debug,
            format!("required field is absent: {field}"),
        )
    }

    /// A field was present but unparseable.
    #[must_use]
    pub fn illegal_value(message: impl Into<String>) -> Self {
        Self::new(FailureKind::IllegalValue, Severity::Debug, message)
    }

    /// No signature element was found.
    #[must_use]
    pub fn signature_missing(message: impl Into<String>) -> Self {
        Self::new(
            FailureKind::SignatureFailure(SignatureFailureKind::Missing),
            Severity::Error,
            message,
        )
    }

    /// A signature element was found but carries no signature.
    #[must_use]
    pub fn signature_unsigned(message: impl Into<String>) -> Self {
        Self::new(
            FailureKind::SignatureFailure(SignatureFailureKind::Unsigned),
            Severity::Error,
            message,
        )
    }

    /// The signature failed digest or cryptographic verification.
    #[must_use]
    pub fn signature_invalid(message: impl Into<String>) -> Self {
        Self::new(
            FailureKind::SignatureFailure(SignatureFailureKind::Invalid),
            Severity::Error,
            message,
        )
    }

    /// Decryption failed or a disallowed algorithm was declared.
    #[must_use]
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::new(FailureKind::DecryptionFailure, Severity::Error, message)
    }

    /// An ID was presented twice within its validity window.
    #[must_use]
    pub fn replay_detected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ReplayDetected, Severity::Warn, message)
    }

    /// A status pair outside the closed grammar.
    #[must_use]
    pub fn status_grammar(message: impl Into<String>) -> Self {
        Self::new(FailureKind::StatusGrammarViolation, Severity::Warn, message)
    }

    /// Wrong number of assertions for the profile.
    #[must_use]
    pub fn assertion_count(message: impl Into<String>) -> Self {
        Self::new(
            FailureKind::AssertionCountViolation,
            Severity::Warn,
            message,
        )
    }

    /// A profile business rule failed.
    #[must_use]
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::new(FailureKind::BusinessRuleViolation, Severity::Warn, message)
    }

    /// Attaches the underlying error.
    #[must_use]
    pub fn with_cause(
        mut self,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The machine-readable failure kind.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The suggested log severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl From<quick_xml::Error> for ValidationFailure {
    fn from(err: quick_xml::Error) -> Self {
        Self::malformed_input(format!("XML parse error: {err}")).with_cause(err)
    }
}

impl From<base64::DecodeError> for ValidationFailure {
    fn from(err: base64::DecodeError) -> Self {
        Self::malformed_input(format!("base64 decode error: {err}")).with_cause(err)
    }
}
