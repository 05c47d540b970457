//! Profile business-rule validation.
//!
//! A profile is a fixed, ordered list of independent rule functions run
//! against the validated message and its validated assertions. Rules are
//! plain functions composed through static slices, wired by the pipeline
//! composer; there is no registry or container. Evaluation fails fast: the
//! first failing rule is surfaced and nothing is merged.

mod profiles;
mod rules;

pub use profiles::{HEALTH_CHECK_RULES, IDP_RULES, MATCHING_SERVICE_RULES};
pub use rules::*;

use chrono::{DateTime, Duration, Utc};
use hub_core::LevelOfAssurance;

use crate::error::SamlResult;
use crate::replay::ReplayCache;
use crate::types::Response;
use crate::validated::{ValidatedAssertions, ValidatedMessage};

/// Everything a rule may inspect.
pub struct ValidationContext<'a> {
    /// The signature-validated response envelope.
    pub message: &'a ValidatedMessage<Response>,
    /// The decrypted, signature-validated assertions.
    pub assertions: &'a ValidatedAssertions,
    /// The ID of the request this response must answer, when known.
    pub expected_in_response_to: Option<&'a str>,
    /// The client IP the hub observed, when available.
    pub observed_client_ip: Option<&'a str>,
    /// Replay cache shared across requests.
    pub replay: &'a dyn ReplayCache,
    /// Validity window for assertion IDs.
    pub assertion_ttl: Duration,
    /// Minimum acceptable level of assurance, when configured.
    pub minimum_level: Option<LevelOfAssurance>,
    /// How many assertions a success response must carry.
    pub expected_assertions: usize,
    /// The instant validation runs at.
    pub now: DateTime<Utc>,
}

/// A single independent rule check.
pub type RuleFn = fn(&ValidationContext<'_>) -> SamlResult<()>;

/// Runs the profile's rules in order, surfacing the first failure.
pub fn run_rules(rules: &[RuleFn], ctx: &ValidationContext<'_>) -> SamlResult<()> {
    for rule in rules {
        rule(ctx)?;
    }
    Ok(())
}
