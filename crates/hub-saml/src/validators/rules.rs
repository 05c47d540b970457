//! The individual rule checks profiles are composed from.
//!
//! Each rule is independent and order-agnostic in intent; composition order
//! lives in [`super::profiles`].

use crate::error::{SamlResult, ValidationFailure};
use crate::replay::ReplayCategory;
use crate::types::{AssertionRole, Attribute, NameIdFormat};

use super::ValidationContext;

/// Issuers must be non-empty and, when a format is declared, use the
/// `entity` name-ID format.
pub fn issuer_is_entity_format(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    for assertion in ctx.assertions.iter() {
        if assertion.issuer.trim().is_empty() {
            return Err(ValidationFailure::business_rule(format!(
                "assertion {} has an empty issuer",
                assertion.id
            )));
        }
        if let Some(format) = assertion.issuer_format.as_deref() {
            if format != NameIdFormat::Entity.uri() {
                return Err(ValidationFailure::business_rule(format!(
                    "assertion {} issuer format must be {}, got {format}",
                    assertion.id,
                    NameIdFormat::Entity.uri()
                )));
            }
        }
    }
    Ok(())
}

/// Every assertion must carry a subject with a name ID.
pub fn subject_present(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    for assertion in ctx.assertions.iter() {
        let has_name_id = assertion
            .subject
            .as_ref()
            .is_some_and(|s| s.name_id.is_some());
        if !has_name_id {
            return Err(ValidationFailure::business_rule(format!(
                "assertion {} has no subject name ID",
                assertion.id
            )));
        }
    }
    Ok(())
}

/// Every assertion needs bearer subject-confirmation data consistent with
/// the request it answers.
pub fn subject_confirmation_valid(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    for assertion in ctx.assertions.iter() {
        let confirmation = assertion
            .subject
            .as_ref()
            .and_then(|s| s.subject_confirmations.first())
            .ok_or_else(|| {
                ValidationFailure::business_rule(format!(
                    "assertion {} has no subject confirmation",
                    assertion.id
                ))
            })?;

        let data = confirmation.data.as_ref().ok_or_else(|| {
            ValidationFailure::business_rule(format!(
                "assertion {} has no subject confirmation data",
                assertion.id
            ))
        })?;

        if let Some(expected) = ctx.expected_in_response_to {
            match data.in_response_to.as_deref() {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Err(ValidationFailure::business_rule(format!(
                        "assertion {} answers {actual}, expected {expected}",
                        assertion.id
                    )));
                }
                None => {
                    return Err(ValidationFailure::business_rule(format!(
                        "assertion {} confirmation data has no InResponseTo",
                        assertion.id
                    )));
                }
            }
        }

        if let Some(not_on_or_after) = data.not_on_or_after {
            if ctx.now >= not_on_or_after {
                return Err(ValidationFailure::business_rule(format!(
                    "assertion {} subject confirmation has expired",
                    assertion.id
                )));
            }
        }
    }
    Ok(())
}

/// A success response must carry an attribute statement somewhere.
pub fn attribute_statement_on_success(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    if !ctx.message.message().is_success() {
        return Ok(());
    }
    let present = ctx
        .assertions
        .iter()
        .any(|a| a.attribute_statement.is_some());
    if !present {
        return Err(ValidationFailure::business_rule(
            "success response carries no attribute statement",
        ));
    }
    Ok(())
}

/// When the hub observed a client IP and an assertion asserts one, they
/// must agree.
pub fn ip_address_matches(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    let Some(observed) = ctx.observed_client_ip else {
        return Ok(());
    };
    for assertion in ctx.assertions.iter() {
        let asserted = assertion
            .attribute_statement
            .as_ref()
            .and_then(|s| s.first_value(Attribute::IP_ADDRESS));
        if let Some(asserted) = asserted {
            if asserted != observed {
                return Err(ValidationFailure::business_rule(format!(
                    "asserted IP address {asserted} does not match observed {observed}"
                )));
            }
        }
    }
    Ok(())
}

/// Each assertion ID must be fresh within its role's replay category.
pub fn assertions_not_replayed(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    for assertion in ctx.assertions.iter() {
        let category = match assertion.role() {
            AssertionRole::MatchingDataset => ReplayCategory::MatchingDatasetAssertion,
            AssertionRole::AuthnStatement => ReplayCategory::AuthnStatementAssertion,
        };
        if !ctx.replay.try_claim(&assertion.id, category, ctx.assertion_ttl) {
            return Err(ValidationFailure::replay_detected(format!(
                "assertion {} was already presented",
                assertion.id
            )));
        }
    }
    Ok(())
}

/// A success response must carry an authn statement; any statement must
/// carry a parseable authn context; a configured minimum level must be met.
///
/// Absence of the statement and absence of the context are distinct
/// failures because they are audited differently.
pub fn authn_statement_checks(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    if !ctx.message.message().is_success() {
        return Ok(());
    }

    let mut statement_seen = false;
    for assertion in ctx.assertions.iter() {
        let Some(statement) = assertion.authn_statement.as_ref() else {
            continue;
        };
        statement_seen = true;

        let class_ref = statement
            .authn_context
            .as_ref()
            .and_then(|c| c.class_ref.as_deref())
            .ok_or_else(|| {
                ValidationFailure::business_rule(format!(
                    "assertion {} has an authn statement without an authn context",
                    assertion.id
                ))
            })?;

        let level = crate::types::level_of_assurance_from_uri(class_ref).ok_or_else(|| {
            ValidationFailure::illegal_value(format!(
                "unparseable level of assurance: {class_ref}"
            ))
        })?;

        if let Some(minimum) = ctx.minimum_level {
            if level < minimum {
                return Err(ValidationFailure::business_rule(format!(
                    "achieved level of assurance {level:?} is below the required {minimum:?}"
                )));
            }
        }
    }

    if !statement_seen {
        return Err(ValidationFailure::business_rule(
            "response carries no authn statement",
        ));
    }
    Ok(())
}

/// A non-success response must not carry assertions.
pub fn no_assertions_unless_success(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    if !ctx.message.message().is_success() && !ctx.assertions.is_empty() {
        return Err(ValidationFailure::business_rule(format!(
            "unexpected assertions on non-success response ({} present)",
            ctx.assertions.len()
        )));
    }
    Ok(())
}

/// A success response must carry exactly the expected assertion count.
pub fn assertion_count_matches(ctx: &ValidationContext<'_>) -> SamlResult<()> {
    if !ctx.message.message().is_success() {
        return Ok(());
    }
    let actual = ctx.assertions.len();
    if actual == 0 {
        return Err(ValidationFailure::assertion_count(
            "missing success assertions",
        ));
    }
    if actual != ctx.expected_assertions {
        return Err(ValidationFailure::assertion_count(format!(
            "expected {}, got {actual}",
            ctx.expected_assertions
        )));
    }
    Ok(())
}
