//! Closed status grammars.
//!
//! Each profile defines a closed table of allowed (top status, sub status)
//! pairs, each mapping to exactly one domain status. The mapping is total:
//! every syntactically valid status either maps or fails with a violation
//! listing the allowed values. There is no silent default, so a profile
//! drifting out of its grammar is caught at the boundary, not downstream.

use std::fmt;

use crate::error::{SamlResult, ValidationFailure};
use crate::types::{hub_status_codes, status_codes, sub_status_codes, Status};

/// One allowed (top, sub) pair and its domain mapping.
#[derive(Debug)]
pub struct GrammarRow<D: 'static> {
    /// Top-level SAML status code URI.
    pub top: &'static str,
    /// Required second-level code URI, or `None` when the pair forbids one.
    pub sub: Option<&'static str>,
    /// The domain status this pair maps to.
    pub domain: D,
}

/// A profile's closed status grammar.
#[derive(Debug)]
pub struct StatusGrammar<D: 'static> {
    /// Profile name used in violation messages.
    pub profile: &'static str,
    /// The allowed rows.
    pub rows: &'static [GrammarRow<D>],
}

impl<D: Copy + fmt::Display> StatusGrammar<D> {
    /// Maps a wire status onto the domain enum, or fails listing the
    /// allowed set.
    ///
    /// When the presented top-level code appears in the table, the listed
    /// set is scoped to that code; otherwise the whole table is listed.
    pub fn map(&self, status: &Status) -> SamlResult<D> {
        let top = status.status_code.value.as_str();
        let sub = status.status_code.sub_status_value();

        for row in self.rows {
            if row.top == top && row.sub == sub {
                return Ok(row.domain);
            }
        }

        let scoped: Vec<&GrammarRow<D>> =
            self.rows.iter().filter(|row| row.top == top).collect();
        let listed: Vec<String> = if scoped.is_empty() {
            self.rows.iter().map(|row| row.domain.to_string()).collect()
        } else {
            scoped.iter().map(|row| row.domain.to_string()).collect()
        };

        Err(ValidationFailure::status_grammar(format!(
            "status ({top}, {}) is not allowed for the {} profile; allowed: {{{}}}",
            sub.unwrap_or("no sub-status"),
            self.profile,
            listed.join(", ")
        )))
    }
}

/// Matching-service outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingServiceStatus {
    /// Exactly one record matched.
    Match,
    /// No record matched.
    NoMatch,
    /// More than one candidate record matched.
    MultiMatch,
    /// A new record was created.
    Created,
    /// Record creation failed.
    CreateFailure,
}

impl fmt::Display for MatchingServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Match => "Match",
            Self::NoMatch => "No Match",
            Self::MultiMatch => "Multi Match",
            Self::Created => "Created",
            Self::CreateFailure => "Create Failure",
        })
    }
}

/// Health-check outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckStatus {
    /// The responder is healthy.
    Healthy,
    /// The responder rejected the query as malformed.
    RequesterError,
}

impl fmt::Display for HealthCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "Healthy",
            Self::RequesterError => "Requester Error",
        })
    }
}

/// Identity-provider outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdpStatus {
    /// Authentication succeeded.
    Success,
    /// Authentication failed.
    AuthenticationFailed,
    /// No acceptable authentication context could be satisfied.
    NoAuthenticationContext,
    /// The request was malformed from the provider's view.
    RequesterError,
    /// The user cancelled authentication.
    AuthenticationCancelled,
    /// Authentication is pending.
    AuthenticationPending,
    /// The provider could not uplift the user's assurance level.
    UpliftFailed,
}

impl IdpStatus {
    /// True when this outcome should carry assertions.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for IdpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "Success",
            Self::AuthenticationFailed => "Authentication Failed",
            Self::NoAuthenticationContext => "No Authentication Context",
            Self::RequesterError => "Requester Error",
            Self::AuthenticationCancelled => "Authentication Cancelled",
            Self::AuthenticationPending => "Authentication Pending",
            Self::UpliftFailed => "Uplift Failed",
        })
    }
}

/// Status grammar for responses from the matching service.
pub static MATCHING_SERVICE_GRAMMAR: StatusGrammar<MatchingServiceStatus> = StatusGrammar {
    profile: "matching-service",
    rows: &[
        GrammarRow {
            top: status_codes::SUCCESS,
            sub: Some(hub_status_codes::MATCH),
            domain: MatchingServiceStatus::Match,
        },
        GrammarRow {
            top: status_codes::SUCCESS,
            sub: Some(hub_status_codes::NO_MATCH),
            domain: MatchingServiceStatus::NoMatch,
        },
        GrammarRow {
            top: status_codes::SUCCESS,
            sub: Some(hub_status_codes::CREATED),
            domain: MatchingServiceStatus::Created,
        },
        GrammarRow {
            top: status_codes::RESPONDER,
            sub: Some(hub_status_codes::NO_MATCH),
            domain: MatchingServiceStatus::NoMatch,
        },
        GrammarRow {
            top: status_codes::RESPONDER,
            sub: Some(hub_status_codes::MULTI_MATCH),
            domain: MatchingServiceStatus::MultiMatch,
        },
        GrammarRow {
            top: status_codes::RESPONDER,
            sub: Some(hub_status_codes::CREATE_FAILURE),
            domain: MatchingServiceStatus::CreateFailure,
        },
    ],
};

/// Status grammar for health-check responses.
pub static HEALTH_CHECK_GRAMMAR: StatusGrammar<HealthCheckStatus> = StatusGrammar {
    profile: "health-check",
    rows: &[
        GrammarRow {
            top: status_codes::SUCCESS,
            sub: Some(hub_status_codes::HEALTHY),
            domain: HealthCheckStatus::Healthy,
        },
        GrammarRow {
            top: status_codes::REQUESTER,
            sub: None,
            domain: HealthCheckStatus::RequesterError,
        },
    ],
};

/// Status grammar for responses from identity providers.
pub static IDP_GRAMMAR: StatusGrammar<IdpStatus> = StatusGrammar {
    profile: "identity-provider",
    rows: &[
        GrammarRow {
            top: status_codes::SUCCESS,
            sub: None,
            domain: IdpStatus::Success,
        },
        GrammarRow {
            top: status_codes::REQUESTER,
            sub: None,
            domain: IdpStatus::RequesterError,
        },
        GrammarRow {
            top: status_codes::RESPONDER,
            sub: Some(sub_status_codes::AUTHN_FAILED),
            domain: IdpStatus::AuthenticationFailed,
        },
        GrammarRow {
            top: status_codes::RESPONDER,
            sub: Some(sub_status_codes::NO_AUTHN_CONTEXT),
            domain: IdpStatus::NoAuthenticationContext,
        },
        GrammarRow {
            top: status_codes::RESPONDER,
            sub: Some(hub_status_codes::AUTHN_CANCEL),
            domain: IdpStatus::AuthenticationCancelled,
        },
        GrammarRow {
            top: status_codes::RESPONDER,
            sub: Some(hub_status_codes::AUTHN_PENDING),
            domain: IdpStatus::AuthenticationPending,
        },
        GrammarRow {
            top: status_codes::RESPONDER,
            sub: Some(hub_status_codes::UPLIFT_FAILED),
            domain: IdpStatus::UpliftFailed,
        },
    ],
};
