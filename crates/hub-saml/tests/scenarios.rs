//! End-to-end pipeline scenarios.
//!
//! Every test builds real wire messages with the outbound builder (real
//! RSA keys, real XML-Enc) and feeds them through the inbound pipelines.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hub_core::{HubConfig, LevelOfAssurance, SystemClock};
use hub_crypto::{
    DecryptingCredential, EncryptionCredential, InMemoryDecryptionKeyStore,
    InMemorySigningKeyStore, SigningCredential, VerificationCredential,
};
use hub_saml::builder::{AssertionEncrypter, OutboundResponseBuilder, SamlEnvelope};
use hub_saml::marshal::{marshal_response, StatusVocabulary};
use hub_saml::parser::RawMessage;
use hub_saml::pipeline::{
    authn_request_to_identity_provider, health_check_response, identity_provider_response,
    matching_service_response, InboundAuthnRequestPipeline, InboundResponsePipeline,
};
use hub_saml::replay::InMemoryReplayCache;
use hub_saml::status_mapper::{HealthCheckStatus, IdpStatus, MatchingServiceStatus};
use hub_saml::{
    hub_status_codes, status_codes, Assertion, Attribute, AttributeStatement, AuthnRequest,
    AuthnStatement, FailureKind, NameId, Response, SignatureFailureKind, Status, StatusCode,
    Subject, SubjectConfirmation, SubjectConfirmationData,
};
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;

const HUB_ACS: &str = "https://hub.example.com/acs";
const REQUEST_ID: &str = "_req1";

/// A federation peer with a signing key pair.
struct Peer {
    entity_id: String,
    signing: SigningCredential,
    verification: VerificationCredential,
}

fn peer(entity_id: &str) -> Peer {
    let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).expect("key generation");
    let private_der = key.to_pkcs8_der().expect("pkcs8").as_bytes().to_vec();
    let public_der = key
        .to_public_key()
        .to_pkcs1_der()
        .expect("pkcs1")
        .as_bytes()
        .to_vec();
    Peer {
        entity_id: entity_id.to_string(),
        signing: SigningCredential::new(entity_id, private_der, None),
        verification: VerificationCredential::new(entity_id, public_der),
    }
}

/// A hub-side decryption key and the matching encryption credential peers
/// would encrypt to.
fn hub_key_pair() -> (DecryptingCredential, EncryptionCredential) {
    let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).expect("key generation");
    let encryption = EncryptionCredential::new("https://hub.example.com", key.to_public_key());
    (DecryptingCredential::new(key), encryption)
}

fn status(top: &str, sub: Option<&str>) -> Status {
    let mut code = StatusCode::new(top);
    if let Some(sub) = sub {
        code = code.with_sub_status(StatusCode::new(sub));
    }
    Status::new(code)
}

fn bearer_subject(in_response_to: &str) -> Subject {
    Subject::new(NameId::persistent("_pid1")).with_confirmation(
        SubjectConfirmation::bearer().with_data(SubjectConfirmationData {
            in_response_to: Some(in_response_to.to_string()),
            ..SubjectConfirmationData::default()
        }),
    )
}

fn matching_dataset_assertion(issuer: &str) -> Assertion {
    Assertion::new(issuer)
        .with_subject(bearer_subject(REQUEST_ID))
        .with_attribute_statement(
            AttributeStatement::new().with_attribute(Attribute::single("surname", "Doe")),
        )
}

fn authn_assertion(issuer: &str, level: LevelOfAssurance) -> Assertion {
    Assertion::new(issuer)
        .with_subject(bearer_subject(REQUEST_ID))
        .with_attribute_statement(AttributeStatement::new())
        .with_authn_statement(AuthnStatement::at_level(level))
}

fn build_response(
    from: &Peer,
    to_hub: &EncryptionCredential,
    status: Status,
    assertions: &[Assertion],
) -> SamlEnvelope {
    let response = Response::with_status(&from.entity_id, status)
        .in_response_to(REQUEST_ID)
        .with_destination(HUB_ACS);
    OutboundResponseBuilder::new(
        from.signing.clone(),
        AssertionEncrypter::Rsa(to_hub.clone()),
        StatusVocabulary::Hub,
    )
    .build(&response, assertions, None)
    .expect("outbound build")
}

fn msa_pipeline(
    from: &Peer,
    decryption_keys: Vec<DecryptingCredential>,
) -> InboundResponsePipeline<MatchingServiceStatus> {
    let mut store = InMemorySigningKeyStore::new();
    store.add(from.verification.clone());
    matching_service_response(
        &HubConfig::default(),
        Arc::new(store),
        &InMemoryDecryptionKeyStore::new(decryption_keys),
        Arc::new(InMemoryReplayCache::new(Arc::new(SystemClock))),
        Arc::new(SystemClock),
    )
}

fn idp_pipeline(
    from: &Peer,
    decryption_keys: Vec<DecryptingCredential>,
    config: &HubConfig,
) -> InboundResponsePipeline<IdpStatus> {
    let mut store = InMemorySigningKeyStore::new();
    store.add(from.verification.clone());
    identity_provider_response(
        config,
        Arc::new(store),
        &InMemoryDecryptionKeyStore::new(decryption_keys),
        Arc::new(InMemoryReplayCache::new(Arc::new(SystemClock))),
        Arc::new(SystemClock),
    )
}

// Scenario 1: (Success, Match), one encrypted assertion, valid signature
// and decryption key.
#[test]
fn matching_service_success_match_end_to_end() {
    let msa = peer("https://msa.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[matching_dataset_assertion(&msa.entity_id)],
    );
    assert_eq!(envelope.destination, HUB_ACS);

    let outcome = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .expect("pipeline should accept the response");

    assert_eq!(outcome.status, MatchingServiceStatus::Match);
    assert_eq!(outcome.assertions.len(), 1);
    assert_eq!(outcome.message.message().issuer, msa.entity_id);
    assert_eq!(outcome.message.credential().entity_id(), msa.entity_id);
}

// Scenario 2: a response without any Signature element.
#[test]
fn unsigned_response_fails_with_missing_signature() {
    let msa = peer("https://msa.example.com");
    let (decrypting, _) = hub_key_pair();

    let response = Response::with_status(
        &msa.entity_id,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
    )
    .in_response_to(REQUEST_ID)
    .with_destination(HUB_ACS);
    let xml = marshal_response(&response, &[], StatusVocabulary::Hub);

    let err = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(xml), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(
        err.kind(),
        FailureKind::SignatureFailure(SignatureFailureKind::Missing)
    );
}

// Scenario 3: (Success, MultiMatch) is outside the matching-service
// grammar; the violation lists the Success row set.
#[test]
fn multi_match_under_success_violates_grammar() {
    let msa = peer("https://msa.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MULTI_MATCH)),
        &[],
    );

    let err = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::StatusGrammarViolation);
    for allowed in ["Match", "No Match", "Created"] {
        assert!(
            err.message().contains(allowed),
            "violation should list {allowed}: {}",
            err.message()
        );
    }
}

// Scenario 4: the same AuthnRequest ID presented twice within the window.
#[test]
fn replayed_authn_request_is_rejected() {
    let rp = peer("https://rp.example.com");

    let mut request = AuthnRequest::new(&rp.entity_id)
        .with_destination("https://hub.example.com/sso")
        .with_requested_level(LevelOfAssurance::Level2);
    request.id = "_fixed-request-id".to_string();
    let envelope = authn_request_to_identity_provider(rp.signing.clone())
        .build(&request, Some("state42".to_string()))
        .expect("outbound build");
    assert_eq!(envelope.relay_state.as_deref(), Some("state42"));

    let mut store = InMemorySigningKeyStore::new();
    store.add(rp.verification.clone());
    let pipeline = InboundAuthnRequestPipeline::new(
        &HubConfig::default(),
        Arc::new(store),
        Arc::new(InMemoryReplayCache::new(Arc::new(SystemClock))),
    );

    let first = pipeline
        .process(&RawMessage::authn_request(envelope.message.clone()))
        .expect("first presentation accepted");
    assert_eq!(first.message().id, "_fixed-request-id");
    assert_eq!(
        first.message().requested_level,
        Some(LevelOfAssurance::Level2)
    );

    let err = pipeline
        .process(&RawMessage::authn_request(envelope.message))
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::ReplayDetected);
}

// Scenario 5: an assertion decryptable only by the rollover key.
#[test]
fn rollover_decryption_key_is_transparent() {
    let msa = peer("https://msa.example.com");
    let (old_decrypting, old_encryption) = hub_key_pair();
    let (current_decrypting, _) = hub_key_pair();

    // Peer still encrypts to the predecessor key.
    let envelope = build_response(
        &msa,
        &old_encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[matching_dataset_assertion(&msa.entity_id)],
    );

    let outcome = msa_pipeline(&msa, vec![current_decrypting, old_decrypting])
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .expect("rollover key should decrypt transparently");
    assert_eq!(outcome.status, MatchingServiceStatus::Match);
}

#[test]
fn no_usable_decryption_key_raises_one_aggregated_failure() {
    let msa = peer("https://msa.example.com");
    let (_, foreign_encryption) = hub_key_pair();
    let (unrelated_decrypting, _) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &foreign_encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[matching_dataset_assertion(&msa.entity_id)],
    );

    let err = msa_pipeline(&msa, vec![unrelated_decrypting])
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::DecryptionFailure);
    assert!(err.message().contains("no configured decryption key"));
}

#[test]
fn tampered_envelope_fails_signature_validation() {
    let msa = peer("https://msa.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[matching_dataset_assertion(&msa.entity_id)],
    );

    let xml = String::from_utf8(STANDARD.decode(envelope.message).unwrap()).unwrap();
    let tampered = xml.replace(HUB_ACS, "https://evil.example.com/acs");
    assert_ne!(xml, tampered);

    let err = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(tampered), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(
        err.kind(),
        FailureKind::SignatureFailure(SignatureFailureKind::Invalid)
    );
}

#[test]
fn signature_from_unknown_signer_is_invalid() {
    let msa = peer("https://msa.example.com");
    // Same claimed entity, different key pair.
    let impostor = peer(&msa.entity_id);
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &impostor,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[matching_dataset_assertion(&msa.entity_id)],
    );

    // The hub only trusts the genuine credential.
    let err = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(
        err.kind(),
        FailureKind::SignatureFailure(SignatureFailureKind::Invalid)
    );
}

#[test]
fn signing_key_rollover_verifies_against_predecessor_entry() {
    let msa = peer("https://msa.example.com");
    let successor = peer(&msa.entity_id);
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[matching_dataset_assertion(&msa.entity_id)],
    );

    // Store lists the new key first; the message is still signed with the
    // predecessor, which sits second in the set.
    let mut store = InMemorySigningKeyStore::new();
    store.add(successor.verification.clone());
    store.add(msa.verification.clone());
    let pipeline = matching_service_response(
        &HubConfig::default(),
        Arc::new(store),
        &InMemoryDecryptionKeyStore::new(vec![decrypting]),
        Arc::new(InMemoryReplayCache::new(Arc::new(SystemClock))),
        Arc::new(SystemClock),
    );

    let outcome = pipeline
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .expect("predecessor signing key should still verify");
    assert_eq!(outcome.status, MatchingServiceStatus::Match);
}

#[test]
fn success_with_zero_assertions_fails_count_check() {
    let msa = peer("https://msa.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[],
    );

    let err = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::AssertionCountViolation);
    assert!(err.message().contains("missing success assertions"));
}

#[test]
fn success_with_too_many_assertions_cites_expected_vs_actual() {
    let msa = peer("https://msa.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[
            matching_dataset_assertion(&msa.entity_id),
            matching_dataset_assertion(&msa.entity_id),
        ],
    );

    let err = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::AssertionCountViolation);
    assert!(err.message().contains("expected 1, got 2"));
}

#[test]
fn assertions_on_non_success_status_are_unexpected() {
    let msa = peer("https://msa.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &encryption,
        status(status_codes::RESPONDER, Some(hub_status_codes::NO_MATCH)),
        &[matching_dataset_assertion(&msa.entity_id)],
    );

    let err = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::BusinessRuleViolation);
    assert!(err.message().contains("unexpected assertions"));
}

#[test]
fn idp_response_with_both_assertion_roles_is_accepted() {
    let idp = peer("https://idp.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &idp,
        &encryption,
        status(status_codes::SUCCESS, None),
        &[
            matching_dataset_assertion(&idp.entity_id),
            authn_assertion(&idp.entity_id, LevelOfAssurance::Level2),
        ],
    );

    let outcome = idp_pipeline(&idp, vec![decrypting], &HubConfig::default())
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .expect("identity-provider response accepted");
    assert_eq!(outcome.status, IdpStatus::Success);
    assert_eq!(outcome.assertions.len(), 2);
}

#[test]
fn replayed_assertion_ids_are_rejected_within_one_pipeline() {
    let idp = peer("https://idp.example.com");
    let (decrypting, encryption) = hub_key_pair();
    let pipeline = idp_pipeline(&idp, vec![decrypting], &HubConfig::default());

    let assertions = [
        matching_dataset_assertion(&idp.entity_id),
        authn_assertion(&idp.entity_id, LevelOfAssurance::Level2),
    ];
    let envelope = build_response(
        &idp,
        &encryption,
        status(status_codes::SUCCESS, None),
        &assertions,
    );

    pipeline
        .process(
            &RawMessage::response(envelope.message.clone()),
            Some(REQUEST_ID),
            None,
        )
        .expect("first presentation accepted");

    // Same assertion IDs a second time: the replay cache rejects them.
    let err = pipeline
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::ReplayDetected);
}

#[test]
fn idp_success_without_authn_statement_is_rejected() {
    let idp = peer("https://idp.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &idp,
        &encryption,
        status(status_codes::SUCCESS, None),
        &[
            matching_dataset_assertion(&idp.entity_id),
            matching_dataset_assertion(&idp.entity_id),
        ],
    );

    let err = idp_pipeline(&idp, vec![decrypting], &HubConfig::default())
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::BusinessRuleViolation);
    assert!(err.message().contains("no authn statement"));
}

#[test]
fn achieved_level_below_configured_minimum_is_rejected() {
    let idp = peer("https://idp.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let mut config = HubConfig::default();
    config.minimum_level_of_assurance = Some(LevelOfAssurance::Level2);

    let envelope = build_response(
        &idp,
        &encryption,
        status(status_codes::SUCCESS, None),
        &[
            matching_dataset_assertion(&idp.entity_id),
            authn_assertion(&idp.entity_id, LevelOfAssurance::Level1),
        ],
    );

    let err = idp_pipeline(&idp, vec![decrypting], &config)
        .process(&RawMessage::response(envelope.message), Some(REQUEST_ID), None)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::BusinessRuleViolation);
    assert!(err.message().contains("below the required"));
}

#[test]
fn asserted_ip_mismatch_is_rejected() {
    let idp = peer("https://idp.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let mds = Assertion::new(&idp.entity_id)
        .with_subject(bearer_subject(REQUEST_ID))
        .with_attribute_statement(
            AttributeStatement::new()
                .with_attribute(Attribute::single(Attribute::IP_ADDRESS, "203.0.113.7")),
        );
    let envelope = build_response(
        &idp,
        &encryption,
        status(status_codes::SUCCESS, None),
        &[mds, authn_assertion(&idp.entity_id, LevelOfAssurance::Level2)],
    );

    let err = idp_pipeline(&idp, vec![decrypting], &HubConfig::default())
        .process(
            &RawMessage::response(envelope.message),
            Some(REQUEST_ID),
            Some("198.51.100.9"),
        )
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::BusinessRuleViolation);
    assert!(err.message().contains("does not match observed"));
}

#[test]
fn health_check_response_needs_signature_and_grammar_only() {
    let responder = peer("https://msa.example.com/healthcheck");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &responder,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::HEALTHY)),
        &[],
    );

    let mut store = InMemorySigningKeyStore::new();
    store.add(responder.verification.clone());
    let outcome = health_check_response(
        &HubConfig::default(),
        Arc::new(store),
        &InMemoryDecryptionKeyStore::new(vec![decrypting]),
        Arc::new(InMemoryReplayCache::new(Arc::new(SystemClock))),
        Arc::new(SystemClock),
    )
    .process(&RawMessage::response(envelope.message), None, None)
    .expect("healthy response accepted");
    assert_eq!(outcome.status, HealthCheckStatus::Healthy);
    assert!(outcome.assertions.is_empty());
}

// Exhaustiveness: over the full product of known top codes and sub codes,
// exactly the six documented pairs map for the matching-service profile.
#[test]
fn matching_service_grammar_is_exhaustive() {
    use hub_saml::status_mapper::MATCHING_SERVICE_GRAMMAR;

    let tops = [
        status_codes::SUCCESS,
        status_codes::REQUESTER,
        status_codes::RESPONDER,
    ];
    let subs = [
        None,
        Some(hub_status_codes::MATCH),
        Some(hub_status_codes::NO_MATCH),
        Some(hub_status_codes::MULTI_MATCH),
        Some(hub_status_codes::CREATED),
        Some(hub_status_codes::CREATE_FAILURE),
        Some(hub_status_codes::HEALTHY),
    ];

    let mut accepted = 0;
    for top in tops {
        for sub in subs {
            if MATCHING_SERVICE_GRAMMAR.map(&status(top, sub)).is_ok() {
                accepted += 1;
            }
        }
    }
    assert_eq!(accepted, 6);
}

#[test]
fn in_response_to_mismatch_is_rejected() {
    let msa = peer("https://msa.example.com");
    let (decrypting, encryption) = hub_key_pair();

    let envelope = build_response(
        &msa,
        &encryption,
        status(status_codes::SUCCESS, Some(hub_status_codes::MATCH)),
        &[matching_dataset_assertion(&msa.entity_id)],
    );

    let err = msa_pipeline(&msa, vec![decrypting])
        .process(&RawMessage::response(envelope.message), Some("_other"), None)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::BusinessRuleViolation);
    assert!(err.message().contains("expected _other"));
}
