//! SAML 2.0 validation, decryption and transformation pipeline for the
//! identity-federation hub.
//!
//! The pipeline turns raw, untrusted, signed/encrypted XML into typed domain
//! objects the rest of the hub can safely trust, and turns domain objects
//! back into correctly signed and encrypted wire messages:
//!
//! - [`parser`] - size-bounded decoding and parsing into unvalidated types
//! - [`signature`] - XML-DSig signing and rollover-aware validation
//! - [`decrypt`] - ordered multi-key decrypter chain with an algorithm
//!   allow-list
//! - [`replay`] - atomic check-and-insert replay protection
//! - [`status_mapper`] - closed status grammars per profile
//! - [`validators`] - composed business-rule checks per profile
//! - [`builder`] - outbound marshal → sign → encrypt → sign → encode stages
//! - [`pipeline`] - named, table-driven pipelines per message type/profile
//!
//! Trust is carried in the type system: only the signature validators can
//! construct [`validated::ValidatedMessage`] and
//! [`validated::ValidatedAssertions`], and everything downstream accepts
//! only those wrappers. Forgetting to validate is a compile error, not a
//! runtime bug.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod decrypt;
pub mod error;
pub mod marshal;
pub mod parser;
pub mod pipeline;
pub mod replay;
pub mod signature;
pub mod status_mapper;
pub mod types;
pub mod validated;
pub mod validators;

pub use error::{FailureKind, SamlResult, Severity, SignatureFailureKind, ValidationFailure};
pub use types::*;
pub use validated::{ValidatedAssertions, ValidatedMessage};
