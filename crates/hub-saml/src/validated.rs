//! Proof-of-validation wrappers.
//!
//! These types can only be constructed by the signature validators, so a
//! function that takes a [`ValidatedMessage`] cannot be handed a bare
//! [`crate::parser::ParsedObject`] by mistake. "Forgot to validate" is a
//! compile error, not a runtime flag.

use hub_crypto::VerificationCredential;

use crate::parser::ParsedObject;
use crate::types::Assertion;

/// A message whose envelope signature verified against a trusted credential.
#[derive(Debug, Clone)]
pub struct ValidatedMessage<T> {
    message: T,
    xml: String,
    credential: VerificationCredential,
}

impl<T> ValidatedMessage<T> {
    /// Constructed only by the signature validator on success.
    pub(crate) fn new(parsed: ParsedObject<T>, credential: VerificationCredential) -> Self {
        let (message, xml) = parsed.into_parts();
        Self {
            message,
            xml,
            credential,
        }
    }

    /// The validated message.
    #[must_use]
    pub fn message(&self) -> &T {
        &self.message
    }

    /// The source XML whose signature verified.
    #[must_use]
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// The credential that verified the signature.
    #[must_use]
    pub fn credential(&self) -> &VerificationCredential {
        &self.credential
    }
}

/// A set of decrypted assertions whose signatures each verified.
#[derive(Debug, Clone)]
pub struct ValidatedAssertions {
    assertions: Vec<Assertion>,
    credentials: Vec<VerificationCredential>,
}

impl ValidatedAssertions {
    /// Constructed only by the assertion signature validator on success.
    pub(crate) fn new(
        assertions: Vec<Assertion>,
        credentials: Vec<VerificationCredential>,
    ) -> Self {
        Self {
            assertions,
            credentials,
        }
    }

    /// The credential that verified each assertion, index-aligned with
    /// [`Self::as_slice`].
    #[must_use]
    pub fn credentials(&self) -> &[VerificationCredential] {
        &self.credentials
    }

    /// The validated assertions, in wire order.
    #[must_use]
    pub fn as_slice(&self) -> &[Assertion] {
        &self.assertions
    }

    /// Number of assertions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    /// True when the response carried no assertions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// Iterates over the assertions.
    pub fn iter(&self) -> std::slice::Iter<'_, Assertion> {
        self.assertions.iter()
    }
}
