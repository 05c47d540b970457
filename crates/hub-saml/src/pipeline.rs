//! Named, table-driven pipelines per message type and profile.
//!
//! Each inbound profile is one static [`ProfileDefinition`] row (status
//! grammar, rule slice, expected assertion count) consumed by one generic
//! runner, so adding or adjusting a profile touches the table and nothing
//! else. Historically the drift between hand-wired profiles (a duplicate
//! check present in one message type, forgotten in another) was the bug
//! class this layout removes.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use hub_core::{Clock, Event, EventType, HubConfig, LevelOfAssurance};
use hub_crypto::{
    DecryptionKeyStore, EncryptionCredential, SigningCredential, SigningKeyStore,
};

use crate::builder::{AssertionEncrypter, OutboundAuthnRequestBuilder, OutboundResponseBuilder};
use crate::decrypt::DecrypterChain;
use crate::error::{FailureKind, SamlResult, ValidationFailure};
use crate::marshal::StatusVocabulary;
use crate::parser::{BoundedParser, RawMessage};
use crate::replay::{ReplayCache, ReplayCategory};
use crate::signature::{AssertionSignatureValidator, MessageSignatureValidator};
use crate::status_mapper::{
    HealthCheckStatus, IdpStatus, MatchingServiceStatus, StatusGrammar, HEALTH_CHECK_GRAMMAR,
    IDP_GRAMMAR, MATCHING_SERVICE_GRAMMAR,
};
use crate::types::{AuthnRequest, Response};
use crate::validated::{ValidatedAssertions, ValidatedMessage};
use crate::validators::{
    run_rules, RuleFn, ValidationContext, HEALTH_CHECK_RULES, IDP_RULES, MATCHING_SERVICE_RULES,
};

/// One row of the inbound profile table.
pub struct ProfileDefinition<D: 'static> {
    /// Profile name, used in audit events.
    pub name: &'static str,
    /// The closed status grammar.
    pub grammar: &'static StatusGrammar<D>,
    /// The ordered rule slice.
    pub rules: &'static [RuleFn],
    /// Assertions a success response must carry.
    pub expected_assertions: usize,
}

/// Profile row for identity-provider responses: a matching-dataset
/// assertion plus an authn-statement assertion.
pub static IDP_PROFILE: ProfileDefinition<IdpStatus> = ProfileDefinition {
    name: "identity-provider",
    grammar: &IDP_GRAMMAR,
    rules: IDP_RULES,
    expected_assertions: 2,
};

/// Profile row for matching-service responses: exactly one assertion.
pub static MATCHING_SERVICE_PROFILE: ProfileDefinition<MatchingServiceStatus> =
    ProfileDefinition {
        name: "matching-service",
        grammar: &MATCHING_SERVICE_GRAMMAR,
        rules: MATCHING_SERVICE_RULES,
        expected_assertions: 1,
    };

/// Profile row for health-check responses: no assertions at all.
pub static HEALTH_CHECK_PROFILE: ProfileDefinition<HealthCheckStatus> = ProfileDefinition {
    name: "health-check",
    grammar: &HEALTH_CHECK_GRAMMAR,
    rules: HEALTH_CHECK_RULES,
    expected_assertions: 0,
};

/// The fully validated outcome of an inbound response pipeline.
#[derive(Debug)]
pub struct InboundResponse<D> {
    /// The signature-validated envelope.
    pub message: ValidatedMessage<Response>,
    /// The decrypted, signature-validated assertions.
    pub assertions: ValidatedAssertions,
    /// The mapped domain status.
    pub status: D,
}

/// Generic inbound response runner, specialized by a profile row.
pub struct InboundResponsePipeline<D: Copy + fmt::Display + 'static> {
    profile: &'static ProfileDefinition<D>,
    parser: BoundedParser,
    message_validator: MessageSignatureValidator,
    assertion_validator: AssertionSignatureValidator,
    decrypter: DecrypterChain,
    replay: Arc<dyn ReplayCache>,
    clock: Arc<dyn Clock>,
    assertion_ttl: Duration,
    minimum_level: Option<LevelOfAssurance>,
}

impl<D: Copy + fmt::Display + 'static> InboundResponsePipeline<D> {
    fn for_profile(
        profile: &'static ProfileDefinition<D>,
        config: &HubConfig,
        signing_keys: Arc<dyn SigningKeyStore>,
        decryption_keys: &dyn DecryptionKeyStore,
        replay: Arc<dyn ReplayCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profile,
            parser: BoundedParser::new(config.limits.clone()),
            message_validator: MessageSignatureValidator::new(signing_keys.clone()),
            assertion_validator: AssertionSignatureValidator::new(signing_keys),
            decrypter: DecrypterChain::from_store(decryption_keys),
            replay,
            clock,
            assertion_ttl: Duration::seconds(config.replay.assertion_seconds as i64),
            minimum_level: config.minimum_level_of_assurance,
        }
    }

    /// Runs the full inbound sequence for one wire message.
    ///
    /// `expected_in_response_to` is the request ID this response must
    /// answer; `observed_client_ip` enables the IP consistency rule.
    pub fn process(
        &self,
        raw: &RawMessage,
        expected_in_response_to: Option<&str>,
        observed_client_ip: Option<&str>,
    ) -> SamlResult<InboundResponse<D>> {
        let outcome = self.run(raw, expected_in_response_to, observed_client_ip);
        match &outcome {
            Ok(accepted) => {
                Event::builder(EventType::ResponseAccepted)
                    .entity(&accepted.message.message().issuer)
                    .message(&accepted.message.message().id)
                    .detail("profile", self.profile.name)
                    .build()
                    .emit();
            }
            Err(failure) => {
                Event::builder(failure_event_type(failure.kind()))
                    .failure(failure.to_string())
                    .detail("profile", self.profile.name)
                    .build()
                    .emit();
            }
        }
        outcome
    }

    fn run(
        &self,
        raw: &RawMessage,
        expected_in_response_to: Option<&str>,
        observed_client_ip: Option<&str>,
    ) -> SamlResult<InboundResponse<D>> {
        let parsed = self.parser.parse_response(raw)?;
        let message = self.message_validator.validate(parsed)?;
        let status = self.profile.grammar.map(&message.message().status)?;

        let decrypted = self.decrypter.decrypt_assertions(&message)?;
        let parsed_assertions = decrypted
            .iter()
            .map(|xml| self.parser.parse_assertion_xml(xml))
            .collect::<SamlResult<Vec<_>>>()?;
        let assertions = self.assertion_validator.validate(parsed_assertions)?;

        let ctx = ValidationContext {
            message: &message,
            assertions: &assertions,
            expected_in_response_to,
            observed_client_ip,
            replay: &*self.replay,
            assertion_ttl: self.assertion_ttl,
            minimum_level: self.minimum_level,
            expected_assertions: self.profile.expected_assertions,
            now: self.clock.now(),
        };
        run_rules(self.profile.rules, &ctx)?;

        Ok(InboundResponse {
            message,
            assertions,
            status,
        })
    }
}

/// Maps a failure kind onto its audit event type.
fn failure_event_type(kind: FailureKind) -> EventType {
    match kind {
        FailureKind::SignatureFailure(_) => EventType::SignatureRejected,
        FailureKind::DecryptionFailure => EventType::DecryptionRejected,
        FailureKind::ReplayDetected => EventType::ReplayRejected,
        FailureKind::StatusGrammarViolation => EventType::StatusRejected,
        _ => EventType::ValidationRejected,
    }
}

/// Pipeline for inbound relying-party authentication requests:
/// parse → signature → replay-claim.
pub struct InboundAuthnRequestPipeline {
    parser: BoundedParser,
    validator: MessageSignatureValidator,
    replay: Arc<dyn ReplayCache>,
    request_ttl: Duration,
}

impl InboundAuthnRequestPipeline {
    /// Wires the request pipeline from configuration and stores.
    #[must_use]
    pub fn new(
        config: &HubConfig,
        signing_keys: Arc<dyn SigningKeyStore>,
        replay: Arc<dyn ReplayCache>,
    ) -> Self {
        Self {
            parser: BoundedParser::new(config.limits.clone()),
            validator: MessageSignatureValidator::new(signing_keys),
            replay,
            request_ttl: Duration::seconds(config.replay.authn_request_seconds as i64),
        }
    }

    /// Runs the request sequence for one wire message.
    pub fn process(&self, raw: &RawMessage) -> SamlResult<ValidatedMessage<AuthnRequest>> {
        let outcome = self.run(raw);
        match &outcome {
            Ok(accepted) => {
                Event::builder(EventType::AuthnRequestAccepted)
                    .entity(&accepted.message().issuer)
                    .message(&accepted.message().id)
                    .build()
                    .emit();
            }
            Err(failure) => {
                Event::builder(failure_event_type(failure.kind()))
                    .failure(failure.to_string())
                    .build()
                    .emit();
            }
        }
        outcome
    }

    fn run(&self, raw: &RawMessage) -> SamlResult<ValidatedMessage<AuthnRequest>> {
        let parsed = self.parser.parse_authn_request(raw)?;
        let message = self.validator.validate(parsed)?;

        // Claimed only after the signature verified, so unauthenticated
        // garbage cannot poison the cache.
        let id = &message.message().id;
        if !self
            .replay
            .try_claim(id, ReplayCategory::AuthnRequest, self.request_ttl)
        {
            return Err(ValidationFailure::replay_detected(format!(
                "request {id} was already presented"
            )));
        }

        Ok(message)
    }
}

/// Inbound pipeline for identity-provider responses.
#[must_use]
pub fn identity_provider_response(
    config: &HubConfig,
    signing_keys: Arc<dyn SigningKeyStore>,
    decryption_keys: &dyn DecryptionKeyStore,
    replay: Arc<dyn ReplayCache>,
    clock: Arc<dyn Clock>,
) -> InboundResponsePipeline<IdpStatus> {
    InboundResponsePipeline::for_profile(
        &IDP_PROFILE,
        config,
        signing_keys,
        decryption_keys,
        replay,
        clock,
    )
}

/// Inbound pipeline for matching-service responses.
#[must_use]
pub fn matching_service_response(
    config: &HubConfig,
    signing_keys: Arc<dyn SigningKeyStore>,
    decryption_keys: &dyn DecryptionKeyStore,
    replay: Arc<dyn ReplayCache>,
    clock: Arc<dyn Clock>,
) -> InboundResponsePipeline<MatchingServiceStatus> {
    InboundResponsePipeline::for_profile(
        &MATCHING_SERVICE_PROFILE,
        config,
        signing_keys,
        decryption_keys,
        replay,
        clock,
    )
}

/// Inbound pipeline for health-check responses.
#[must_use]
pub fn health_check_response(
    config: &HubConfig,
    signing_keys: Arc<dyn SigningKeyStore>,
    decryption_keys: &dyn DecryptionKeyStore,
    replay: Arc<dyn ReplayCache>,
    clock: Arc<dyn Clock>,
) -> InboundResponsePipeline<HealthCheckStatus> {
    InboundResponsePipeline::for_profile(
        &HEALTH_CHECK_PROFILE,
        config,
        signing_keys,
        decryption_keys,
        replay,
        clock,
    )
}

/// Outbound pipeline for responses to relying parties: assertions are
/// signed, then encrypted to the recipient, then the envelope is signed.
#[must_use]
pub fn response_to_relying_party(
    signing: SigningCredential,
    recipient: EncryptionCredential,
    vocabulary: StatusVocabulary,
) -> OutboundResponseBuilder {
    OutboundResponseBuilder::new(signing, AssertionEncrypter::Rsa(recipient), vocabulary)
}

/// Outbound pipeline for health-check attribute queries: no encrypting
/// recipient is configured, so assertions pass through in the clear.
#[must_use]
pub fn health_check_query(signing: SigningCredential) -> OutboundResponseBuilder {
    OutboundResponseBuilder::new(signing, AssertionEncrypter::Noop, StatusVocabulary::Hub)
}

/// Outbound pipeline for authentication requests toward identity providers.
#[must_use]
pub fn authn_request_to_identity_provider(
    signing: SigningCredential,
) -> OutboundAuthnRequestBuilder {
    OutboundAuthnRequestBuilder::new(signing)
}
