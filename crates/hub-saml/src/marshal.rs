//! Domain-object to SAML XML marshalling.
//!
//! `format!`-based construction with explicit escaping. Documents are built
//! so the signer can splice a `<ds:Signature>` in after the Issuer element
//! and the bounded parser can read its own output back.

use chrono::{DateTime, Utc};

use crate::types::{
    sub_status_codes, Assertion, AuthnRequest, NameIdFormat, Response, Status, SAMLP_NS, SAML_NS,
    XMLENC_NS,
};

/// Which status vocabulary outbound messages carry.
///
/// Chosen at pipeline construction time per transaction, never per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusVocabulary {
    /// Full hub vocabulary, sub-status URIs included.
    #[default]
    Hub,
    /// Legacy SAML-profile vocabulary: core status codes only; hub
    /// sub-statuses are stripped.
    SamlCore,
}

const HUB_STATUS_PREFIX: &str = "urn:hub:identity-federation:status:";

const STANDARD_SUB_STATUSES: &[&str] = &[
    sub_status_codes::AUTHN_FAILED,
    sub_status_codes::NO_AUTHN_CONTEXT,
    sub_status_codes::REQUEST_DENIED,
];

/// Escapes XML special characters in text and attribute values.
#[must_use]
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Marshals a Status element under the chosen vocabulary.
#[must_use]
pub fn marshal_status(status: &Status, vocabulary: StatusVocabulary) -> String {
    let top = &status.status_code.value;
    let sub = status.status_code.sub_status_value().filter(|sub| {
        match vocabulary {
            StatusVocabulary::Hub => true,
            StatusVocabulary::SamlCore => {
                !sub.starts_with(HUB_STATUS_PREFIX) && STANDARD_SUB_STATUSES.contains(sub)
            }
        }
    });

    let code_xml = match sub {
        Some(sub) => format!(
            r#"<samlp:StatusCode Value="{}">
<samlp:StatusCode Value="{}"/>
</samlp:StatusCode>"#,
            xml_escape(top),
            xml_escape(sub)
        ),
        None => format!(r#"<samlp:StatusCode Value="{}"/>"#, xml_escape(top)),
    };

    let message_xml = status
        .status_message
        .as_deref()
        .map(|m| format!("\n<samlp:StatusMessage>{}</samlp:StatusMessage>", xml_escape(m)))
        .unwrap_or_default();

    format!("<samlp:Status>\n{code_xml}{message_xml}\n</samlp:Status>")
}

/// Marshals an assertion to a standalone document ready for signing.
#[must_use]
pub fn marshal_assertion(assertion: &Assertion) -> String {
    let mut body = String::new();

    if let Some(subject) = &assertion.subject {
        body.push_str("<saml:Subject>\n");
        if let Some(name_id) = &subject.name_id {
            let format_attr = name_id
                .format
                .as_deref()
                .map(|f| format!(r#" Format="{}""#, xml_escape(f)))
                .unwrap_or_default();
            body.push_str(&format!(
                "<saml:NameID{format_attr}>{}</saml:NameID>\n",
                xml_escape(&name_id.value)
            ));
        }
        for confirmation in &subject.subject_confirmations {
            body.push_str(&format!(
                r#"<saml:SubjectConfirmation Method="{}">"#,
                xml_escape(&confirmation.method)
            ));
            if let Some(data) = &confirmation.data {
                let mut attrs = String::new();
                if let Some(v) = &data.in_response_to {
                    attrs.push_str(&format!(r#" InResponseTo="{}""#, xml_escape(v)));
                }
                if let Some(v) = data.not_on_or_after {
                    attrs.push_str(&format!(r#" NotOnOrAfter="{}""#, format_instant(v)));
                }
                if let Some(v) = &data.recipient {
                    attrs.push_str(&format!(r#" Recipient="{}""#, xml_escape(v)));
                }
                if let Some(v) = &data.address {
                    attrs.push_str(&format!(r#" Address="{}""#, xml_escape(v)));
                }
                body.push_str(&format!("\n<saml:SubjectConfirmationData{attrs}/>\n"));
            }
            body.push_str("</saml:SubjectConfirmation>\n");
        }
        body.push_str("</saml:Subject>\n");
    }

    if let Some(conditions) = &assertion.conditions {
        let mut attrs = String::new();
        if let Some(v) = conditions.not_before {
            attrs.push_str(&format!(r#" NotBefore="{}""#, format_instant(v)));
        }
        if let Some(v) = conditions.not_on_or_after {
            attrs.push_str(&format!(r#" NotOnOrAfter="{}""#, format_instant(v)));
        }
        if conditions.audiences.is_empty() {
            body.push_str(&format!("<saml:Conditions{attrs}/>\n"));
        } else {
            body.push_str(&format!("<saml:Conditions{attrs}>\n"));
            for audience in &conditions.audiences {
                body.push_str(&format!(
                    "<saml:AudienceRestriction><saml:Audience>{}</saml:Audience></saml:AudienceRestriction>\n",
                    xml_escape(audience)
                ));
            }
            body.push_str("</saml:Conditions>\n");
        }
    }

    if let Some(statement) = &assertion.authn_statement {
        body.push_str(&format!(
            r#"<saml:AuthnStatement AuthnInstant="{}">"#,
            format_instant(statement.authn_instant)
        ));
        if let Some(context) = &statement.authn_context {
            body.push_str("\n<saml:AuthnContext>");
            if let Some(class_ref) = &context.class_ref {
                body.push_str(&format!(
                    "<saml:AuthnContextClassRef>{}</saml:AuthnContextClassRef>",
                    xml_escape(class_ref)
                ));
            }
            body.push_str("</saml:AuthnContext>\n");
        }
        body.push_str("</saml:AuthnStatement>\n");
    }

    if let Some(statement) = &assertion.attribute_statement {
        body.push_str("<saml:AttributeStatement>\n");
        for attribute in &statement.attributes {
            body.push_str(&format!(
                r#"<saml:Attribute Name="{}">"#,
                xml_escape(&attribute.name)
            ));
            for value in &attribute.values {
                body.push_str(&format!(
                    "<saml:AttributeValue>{}</saml:AttributeValue>",
                    xml_escape(value)
                ));
            }
            body.push_str("</saml:Attribute>\n");
        }
        body.push_str("</saml:AttributeStatement>\n");
    }

    let issuer_format = assertion
        .issuer_format
        .clone()
        .unwrap_or_else(|| NameIdFormat::Entity.uri().to_string());

    format!(
        r#"<saml:Assertion xmlns:saml="{SAML_NS}" ID="{}" Version="2.0" IssueInstant="{}">
<saml:Issuer Format="{}">{}</saml:Issuer>
{body}</saml:Assertion>"#,
        xml_escape(&assertion.id),
        format_instant(assertion.issue_instant),
        xml_escape(&issuer_format),
        xml_escape(&assertion.issuer),
    )
}

/// Marshals a response envelope around pre-built assertion blocks.
///
/// Blocks are the already signed (and possibly encrypted) assertion
/// documents; they are embedded verbatim.
#[must_use]
pub fn marshal_response(
    response: &Response,
    assertion_blocks: &[String],
    vocabulary: StatusVocabulary,
) -> String {
    let in_response_to = response
        .in_response_to
        .as_deref()
        .map(|v| format!(r#" InResponseTo="{}""#, xml_escape(v)))
        .unwrap_or_default();
    let destination = response
        .destination
        .as_deref()
        .map(|v| format!(r#" Destination="{}""#, xml_escape(v)))
        .unwrap_or_default();

    let mut blocks = String::new();
    for block in assertion_blocks {
        blocks.push('\n');
        blocks.push_str(block);
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:Response xmlns:samlp="{SAMLP_NS}" xmlns:saml="{SAML_NS}" ID="{}" Version="2.0" IssueInstant="{}"{in_response_to}{destination}>
<saml:Issuer>{}</saml:Issuer>
{}{blocks}
</samlp:Response>"#,
        xml_escape(&response.id),
        format_instant(response.issue_instant),
        xml_escape(&response.issuer),
        marshal_status(&response.status, vocabulary),
    )
}

/// Marshals an authentication request ready for signing.
#[must_use]
pub fn marshal_authn_request(request: &AuthnRequest) -> String {
    let destination = request
        .destination
        .as_deref()
        .map(|v| format!(r#" Destination="{}""#, xml_escape(v)))
        .unwrap_or_default();
    let force_authn = if request.force_authn {
        r#" ForceAuthn="true""#
    } else {
        ""
    };

    let requested_context = request
        .requested_level
        .map(|level| {
            format!(
                "\n<samlp:RequestedAuthnContext Comparison=\"minimum\">\n<saml:AuthnContextClassRef>{}</saml:AuthnContextClassRef>\n</samlp:RequestedAuthnContext>",
                crate::types::level_of_assurance_uri(level)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:AuthnRequest xmlns:samlp="{SAMLP_NS}" xmlns:saml="{SAML_NS}" ID="{}" Version="2.0" IssueInstant="{}"{destination}{force_authn}>
<saml:Issuer>{}</saml:Issuer>{requested_context}
</samlp:AuthnRequest>"#,
        xml_escape(&request.id),
        format_instant(request.issue_instant),
        xml_escape(&request.issuer),
    )
}

/// Marshals an EncryptedAssertion block from wire-ready ciphertext parts.
#[must_use]
pub fn marshal_encrypted_assertion(
    content_algorithm: &str,
    key_algorithm: &str,
    encrypted_key_b64: &str,
    cipher_value_b64: &str,
) -> String {
    format!(
        r#"<saml:EncryptedAssertion>
<xenc:EncryptedData xmlns:xenc="{XMLENC_NS}" Type="{XMLENC_NS}Element">
<xenc:EncryptionMethod Algorithm="{}"/>
<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
<xenc:EncryptedKey>
<xenc:EncryptionMethod Algorithm="{}"/>
<xenc:CipherData><xenc:CipherValue>{}</xenc:CipherValue></xenc:CipherData>
</xenc:EncryptedKey>
</ds:KeyInfo>
<xenc:CipherData><xenc:CipherValue>{}</xenc:CipherValue></xenc:CipherData>
</xenc:EncryptedData>
</saml:EncryptedAssertion>"#,
        xml_escape(content_algorithm),
        xml_escape(key_algorithm),
        encrypted_key_b64,
        cipher_value_b64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{hub_status_codes, status_codes, StatusCode};

    #[test]
    fn escape_covers_markup_characters() {
        let escaped = xml_escape(r#"<a b="c&d">"#);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('"'));
        assert_eq!(escaped, "&lt;a b=&quot;c&amp;d&quot;&gt;");
    }

    #[test]
    fn hub_vocabulary_keeps_sub_status() {
        let status = Status::new(
            StatusCode::new(status_codes::RESPONDER)
                .with_sub_status(StatusCode::new(hub_status_codes::MULTI_MATCH)),
        );
        let xml = marshal_status(&status, StatusVocabulary::Hub);
        assert!(xml.contains(hub_status_codes::MULTI_MATCH));
    }

    #[test]
    fn saml_core_vocabulary_strips_hub_sub_status() {
        let status = Status::new(
            StatusCode::new(status_codes::RESPONDER)
                .with_sub_status(StatusCode::new(hub_status_codes::MULTI_MATCH)),
        );
        let xml = marshal_status(&status, StatusVocabulary::SamlCore);
        assert!(!xml.contains(hub_status_codes::MULTI_MATCH));
        assert!(xml.contains(status_codes::RESPONDER));
    }

    #[test]
    fn saml_core_vocabulary_keeps_standard_sub_status() {
        let status = Status::new(
            StatusCode::new(status_codes::RESPONDER)
                .with_sub_status(StatusCode::new(sub_status_codes::AUTHN_FAILED)),
        );
        let xml = marshal_status(&status, StatusVocabulary::SamlCore);
        assert!(xml.contains(sub_status_codes::AUTHN_FAILED));
    }

    #[test]
    fn marshalled_assertion_parses_back() {
        use crate::types::{
            AttributeStatement, Attribute, AuthnStatement, NameId, Subject, SubjectConfirmation,
            SubjectConfirmationData,
        };
        let assertion = Assertion::new("https://hub.example.com")
            .with_subject(
                Subject::new(NameId::persistent("_pid1")).with_confirmation(
                    SubjectConfirmation::bearer().with_data(SubjectConfirmationData {
                        in_response_to: Some("_req1".to_string()),
                        ..SubjectConfirmationData::default()
                    }),
                ),
            )
            .with_authn_statement(AuthnStatement::at_level(hub_core::LevelOfAssurance::Level2))
            .with_attribute_statement(
                AttributeStatement::new().with_attribute(Attribute::single("surname", "Doe")),
            );

        let xml = marshal_assertion(&assertion);
        let parser = crate::parser::BoundedParser::new(hub_core::MessageLimits::default());
        let parsed = parser.parse_assertion_xml(&xml).unwrap();

        assert_eq!(parsed.object().id, assertion.id);
        assert_eq!(parsed.object().issuer, "https://hub.example.com");
        assert_eq!(
            parsed.object().level_of_assurance(),
            Some(hub_core::LevelOfAssurance::Level2)
        );
        assert_eq!(
            parsed
                .object()
                .attribute_statement
                .as_ref()
                .and_then(|s| s.first_value("surname")),
            Some("Doe")
        );
    }
}
