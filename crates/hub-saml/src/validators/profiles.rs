//! The fixed rule order per profile.
//!
//! Adding or adjusting a profile means editing a slice here; the pipeline
//! runner and call sites stay untouched.

use super::rules;
use super::RuleFn;

/// Rules for responses from identity providers.
pub static IDP_RULES: &[RuleFn] = &[
    rules::issuer_is_entity_format,
    rules::subject_present,
    rules::subject_confirmation_valid,
    rules::attribute_statement_on_success,
    rules::ip_address_matches,
    rules::assertions_not_replayed,
    rules::authn_statement_checks,
];

/// Rules for responses from the matching service.
pub static MATCHING_SERVICE_RULES: &[RuleFn] = &[
    rules::no_assertions_unless_success,
    rules::assertion_count_matches,
    rules::issuer_is_entity_format,
    rules::subject_present,
    rules::subject_confirmation_valid,
    rules::attribute_statement_on_success,
];

/// Rules for health-check responses: signature and status grammar only.
pub static HEALTH_CHECK_RULES: &[RuleFn] = &[];
