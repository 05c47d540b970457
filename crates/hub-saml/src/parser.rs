//! Size-bounded decoding and parsing of raw wire messages.
//!
//! The byte ceiling is enforced against the encoded form *before* base64
//! decoding or XML parsing, so oversized input is rejected without paying
//! for it. Parsing produces unvalidated [`ParsedObject`]s; nothing here
//! checks signatures.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hub_core::MessageLimits;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{SamlResult, ValidationFailure};
use crate::types::{
    Assertion, AttributeStatement, Attribute, AuthnContext, AuthnRequest, AuthnStatement,
    Conditions, EncryptedAssertion, NameId, Response, Status, StatusCode, Subject,
    SubjectConfirmation, SubjectConfirmationData,
};

/// The declared class of a wire message, which selects its byte ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// An authentication request.
    AuthnRequest,
    /// A protocol response.
    Response,
    /// A single (decrypted) assertion.
    Assertion,
}

impl MessageClass {
    /// The element name expected at the document root.
    #[must_use]
    pub const fn root_element(self) -> &'static str {
        match self {
            Self::AuthnRequest => "AuthnRequest",
            Self::Response => "Response",
            Self::Assertion => "Assertion",
        }
    }

    /// The byte ceiling for this class under the given limits.
    #[must_use]
    pub const fn max_bytes(self, limits: &MessageLimits) -> usize {
        match self {
            Self::AuthnRequest => limits.authn_request_max_bytes,
            Self::Response => limits.response_max_bytes,
            Self::Assertion => limits.assertion_max_bytes,
        }
    }
}

/// An opaque wire message tagged with its declared class.
#[derive(Debug, Clone)]
pub struct RawMessage {
    body: String,
    class: MessageClass,
}

impl RawMessage {
    /// Wraps a raw AuthnRequest body.
    #[must_use]
    pub fn authn_request(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            class: MessageClass::AuthnRequest,
        }
    }

    /// Wraps a raw Response body.
    #[must_use]
    pub fn response(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            class: MessageClass::Response,
        }
    }

    /// The declared message class.
    #[must_use]
    pub const fn class(&self) -> MessageClass {
        self.class
    }
}

/// A parsed but *not yet trusted* SAML object.
///
/// Retains the decoded source XML so signature validation can verify the
/// exact bytes that were parsed.
#[derive(Debug, Clone)]
pub struct ParsedObject<T> {
    object: T,
    xml: String,
}

impl<T> ParsedObject<T> {
    /// The parsed, unvalidated object.
    #[must_use]
    pub fn object(&self) -> &T {
        &self.object
    }

    /// The decoded source XML.
    #[must_use]
    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub(crate) fn into_parts(self) -> (T, String) {
        (self.object, self.xml)
    }
}

/// Parser enforcing per-class byte ceilings before decoding.
#[derive(Debug, Clone)]
pub struct BoundedParser {
    limits: MessageLimits,
}

impl BoundedParser {
    /// Creates a parser with the given ceilings.
    #[must_use]
    pub const fn new(limits: MessageLimits) -> Self {
        Self { limits }
    }

    /// Parses a raw AuthnRequest.
    pub fn parse_authn_request(
        &self,
        raw: &RawMessage,
    ) -> SamlResult<ParsedObject<AuthnRequest>> {
        let xml = self.decode(raw, MessageClass::AuthnRequest)?;
        let object = extract_authn_request(&xml)?;
        Ok(ParsedObject { object, xml })
    }

    /// Parses a raw Response.
    pub fn parse_response(&self, raw: &RawMessage) -> SamlResult<ParsedObject<Response>> {
        let xml = self.decode(raw, MessageClass::Response)?;
        let object = extract_response(&xml)?;
        Ok(ParsedObject { object, xml })
    }

    /// Parses a decrypted assertion document under the Assertion ceiling.
    pub fn parse_assertion_xml(&self, xml: &str) -> SamlResult<ParsedObject<Assertion>> {
        let ceiling = MessageClass::Assertion.max_bytes(&self.limits);
        if xml.len() > ceiling {
            return Err(ValidationFailure::size_exceeded(format!(
                "Assertion exceeds ceiling ({} > {ceiling} bytes)",
                xml.len()
            )));
        }
        let object = extract_assertion(xml)?;
        Ok(ParsedObject {
            object,
            xml: xml.to_string(),
        })
    }

    /// Checks the ceiling, then base64-decodes unless the body is bare XML.
    fn decode(&self, raw: &RawMessage, expected: MessageClass) -> SamlResult<String> {
        if raw.class != expected {
            return Err(ValidationFailure::malformed_input(format!(
                "message declared as {:?}, expected {expected:?}",
                raw.class
            )));
        }

        let ceiling = expected.max_bytes(&self.limits);
        if raw.body.len() > ceiling {
            return Err(ValidationFailure::size_exceeded(format!(
                "{:?} exceeds ceiling ({} > {ceiling} bytes)",
                raw.class,
                raw.body.len()
            )));
        }

        let trimmed = raw.body.trim_start();
        if trimmed.starts_with('<') {
            return Ok(raw.body.clone());
        }

        // POST bodies line-wrap the base64 payload.
        let compact: String = raw.body.chars().filter(|c| !c.is_whitespace()).collect();
        let decoded = STANDARD.decode(compact.as_bytes())?;
        String::from_utf8(decoded)
            .map_err(|e| ValidationFailure::malformed_input(format!("invalid UTF-8: {e}")))
    }
}

fn parse_instant(value: &str, field: &str) -> SamlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            ValidationFailure::illegal_value(format!("unparseable {field} instant: {e}"))
        })
}

fn attr_value(element: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in element.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return attr.unescape_value().ok().map(|v| v.to_string());
        }
    }
    None
}

fn local_name_of(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

/// Verifies the document root matches the declared class.
fn check_root(seen: &mut bool, name: &str, expected: &str) -> SamlResult<()> {
    if !*seen {
        *seen = true;
        if name != expected {
            return Err(ValidationFailure::malformed_input(format!(
                "expected {expected} document, found {name}"
            )));
        }
    }
    Ok(())
}

fn extract_authn_request(xml: &str) -> SamlResult<AuthnRequest> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root_seen = false;
    let mut id = None;
    let mut issue_instant = None;
    let mut issuer = None;
    let mut destination = None;
    let mut force_authn = false;
    let mut requested_level = None;

    let mut in_issuer = false;
    let mut in_class_ref = false;
    let mut in_signature = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = local_name_of(e.local_name().as_ref());
                check_root(&mut root_seen, &name, "AuthnRequest")?;
                if in_signature {
                    continue;
                }
                match name.as_str() {
                    "AuthnRequest" => {
                        id = attr_value(&e, "ID");
                        issue_instant = attr_value(&e, "IssueInstant");
                        destination = attr_value(&e, "Destination");
                        force_authn =
                            attr_value(&e, "ForceAuthn").as_deref() == Some("true");
                    }
                    "Issuer" => in_issuer = true,
                    "AuthnContextClassRef" => in_class_ref = true,
                    "Signature" => in_signature = true,
                    _ => {}
                }
            }
            Event::Text(t) => {
                if in_signature {
                    continue;
                }
                let text = t.unescape().unwrap_or_default().to_string();
                if in_issuer {
                    issuer = Some(text);
                } else if in_class_ref {
                    requested_level =
                        Some(crate::types::level_of_assurance_from_uri(&text).ok_or_else(
                            || {
                                ValidationFailure::illegal_value(format!(
                                    "unknown level of assurance: {text}"
                                ))
                            },
                        )?);
                }
            }
            Event::End(e) => match local_name_of(e.local_name().as_ref()).as_str() {
                "Issuer" => in_issuer = false,
                "AuthnContextClassRef" => in_class_ref = false,
                "Signature" => in_signature = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(ValidationFailure::malformed_input(
            "no AuthnRequest element found",
        ));
    }

    let id = id.ok_or_else(|| ValidationFailure::missing_field("AuthnRequest ID"))?;
    let issuer = issuer.ok_or_else(|| ValidationFailure::missing_field("Issuer"))?;
    let issue_instant = issue_instant
        .ok_or_else(|| ValidationFailure::missing_field("AuthnRequest IssueInstant"))?;

    Ok(AuthnRequest {
        id,
        issue_instant: parse_instant(&issue_instant, "IssueInstant")?,
        issuer,
        destination,
        force_authn,
        requested_level,
    })
}

fn extract_response(xml: &str) -> SamlResult<Response> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root_seen = false;
    let mut id = None;
    let mut issue_instant = None;
    let mut issuer = None;
    let mut in_response_to = None;
    let mut destination = None;
    let mut top_status: Option<String> = None;
    let mut sub_status: Option<String> = None;
    let mut status_message = None;
    let mut encrypted_assertions = Vec::new();

    let mut in_issuer = false;
    let mut in_status_message = false;
    let mut in_signature = false;

    // EncryptedAssertion accumulator state.
    let mut pending: Option<PendingEncrypted> = None;
    let mut in_encrypted_key = false;
    let mut in_cipher_value = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = local_name_of(e.local_name().as_ref());
                check_root(&mut root_seen, &name, "Response")?;
                if in_signature {
                    continue;
                }
                match name.as_str() {
                    "Response" => {
                        id = attr_value(&e, "ID");
                        issue_instant = attr_value(&e, "IssueInstant");
                        in_response_to = attr_value(&e, "InResponseTo");
                        destination = attr_value(&e, "Destination");
                    }
                    "Issuer" if pending.is_none() => in_issuer = true,
                    // Assertions reach the pipeline only through the
                    // decrypter chain; a plaintext assertion is not a shape
                    // any hub profile produces.
                    "Assertion" => {
                        return Err(ValidationFailure::malformed_input(
                            "inline (unencrypted) assertions are not accepted",
                        ));
                    }
                    "StatusCode" => {
                        let value = attr_value(&e, "Value").ok_or_else(|| {
                            ValidationFailure::missing_field("StatusCode Value")
                        })?;
                        if top_status.is_none() {
                            top_status = Some(value);
                        } else if sub_status.is_none() {
                            sub_status = Some(value);
                        }
                    }
                    "StatusMessage" => in_status_message = true,
                    "EncryptedAssertion" => pending = Some(PendingEncrypted::default()),
                    "EncryptionMethod" => {
                        if let Some(p) = pending.as_mut() {
                            let algorithm = attr_value(&e, "Algorithm");
                            if in_encrypted_key {
                                p.key_algorithm = algorithm;
                            } else {
                                p.content_algorithm = algorithm;
                            }
                        }
                    }
                    "EncryptedKey" => in_encrypted_key = true,
                    "CipherValue" => in_cipher_value = true,
                    "Signature" => in_signature = true,
                    _ => {}
                }
            }
            Event::Text(t) => {
                if in_signature {
                    continue;
                }
                let text = t.unescape().unwrap_or_default().to_string();
                if in_issuer {
                    issuer = Some(text);
                } else if in_status_message {
                    status_message = Some(text);
                } else if in_cipher_value {
                    if let Some(p) = pending.as_mut() {
                        let target = if in_encrypted_key {
                            &mut p.encrypted_key
                        } else {
                            &mut p.cipher_value
                        };
                        target.push_str(text.trim());
                    }
                }
            }
            Event::End(e) => match local_name_of(e.local_name().as_ref()).as_str() {
                "Issuer" => in_issuer = false,
                "StatusMessage" => in_status_message = false,
                "EncryptedKey" => in_encrypted_key = false,
                "CipherValue" => in_cipher_value = false,
                "Signature" => in_signature = false,
                "EncryptedAssertion" => {
                    if let Some(p) = pending.take() {
                        encrypted_assertions.push(p.finish()?);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(ValidationFailure::malformed_input(
            "no Response element found",
        ));
    }

    let id = id.ok_or_else(|| ValidationFailure::missing_field("Response ID"))?;
    let issuer = issuer.ok_or_else(|| ValidationFailure::missing_field("Issuer"))?;
    let issue_instant = issue_instant
        .ok_or_else(|| ValidationFailure::missing_field("Response IssueInstant"))?;
    let top_status = top_status.ok_or_else(|| ValidationFailure::missing_field("Status"))?;

    let mut status_code = StatusCode::new(top_status);
    if let Some(sub) = sub_status {
        status_code = status_code.with_sub_status(StatusCode::new(sub));
    }
    let mut status = Status::new(status_code);
    status.status_message = status_message;

    Ok(Response {
        id,
        issue_instant: parse_instant(&issue_instant, "IssueInstant")?,
        issuer,
        in_response_to,
        destination,
        status,
        encrypted_assertions,
    })
}

#[derive(Default)]
struct PendingEncrypted {
    content_algorithm: Option<String>,
    key_algorithm: Option<String>,
    encrypted_key: String,
    cipher_value: String,
}

impl PendingEncrypted {
    fn finish(self) -> SamlResult<EncryptedAssertion> {
        if self.encrypted_key.is_empty() {
            return Err(ValidationFailure::missing_field(
                "EncryptedAssertion EncryptedKey",
            ));
        }
        if self.cipher_value.is_empty() {
            return Err(ValidationFailure::missing_field(
                "EncryptedAssertion CipherValue",
            ));
        }
        Ok(EncryptedAssertion {
            content_algorithm: self.content_algorithm,
            key_algorithm: self.key_algorithm,
            encrypted_key: self.encrypted_key,
            cipher_value: self.cipher_value,
        })
    }
}

fn extract_assertion(xml: &str) -> SamlResult<Assertion> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root_seen = false;
    let mut id = None;
    let mut issue_instant = None;
    let mut issuer: Option<String> = None;
    let mut issuer_format = None;
    let mut subject: Option<Subject> = None;
    let mut conditions: Option<Conditions> = None;
    let mut authn_statement: Option<AuthnStatement> = None;
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut saw_attribute_statement = false;

    let mut in_issuer = false;
    let mut in_signature = false;
    let mut in_name_id = false;
    let mut name_id_format = None;
    let mut in_audience = false;
    let mut in_class_ref = false;
    let mut pending_confirmation: Option<SubjectConfirmation> = None;
    let mut current_attribute: Option<Attribute> = None;
    let mut in_attribute_value = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let name = local_name_of(e.local_name().as_ref());
                check_root(&mut root_seen, &name, "Assertion")?;
                if in_signature {
                    continue;
                }
                match name.as_str() {
                    "Assertion" => {
                        id = attr_value(&e, "ID");
                        issue_instant = attr_value(&e, "IssueInstant");
                    }
                    "Issuer" => {
                        in_issuer = true;
                        issuer_format = attr_value(&e, "Format");
                    }
                    "Signature" => in_signature = true,
                    "Subject" => {
                        subject.get_or_insert_with(|| Subject {
                            name_id: None,
                            subject_confirmations: Vec::new(),
                        });
                    }
                    "NameID" => {
                        in_name_id = true;
                        name_id_format = attr_value(&e, "Format");
                    }
                    "SubjectConfirmation" => {
                        let method = attr_value(&e, "Method").unwrap_or_default();
                        pending_confirmation = Some(SubjectConfirmation { method, data: None });
                    }
                    "SubjectConfirmationData" => {
                        let data = SubjectConfirmationData {
                            in_response_to: attr_value(&e, "InResponseTo"),
                            not_on_or_after: match attr_value(&e, "NotOnOrAfter") {
                                Some(v) => Some(parse_instant(&v, "NotOnOrAfter")?),
                                None => None,
                            },
                            recipient: attr_value(&e, "Recipient"),
                            address: attr_value(&e, "Address"),
                        };
                        if let Some(c) = pending_confirmation.as_mut() {
                            c.data = Some(data);
                        }
                    }
                    "Conditions" => {
                        conditions = Some(Conditions {
                            not_before: match attr_value(&e, "NotBefore") {
                                Some(v) => Some(parse_instant(&v, "NotBefore")?),
                                None => None,
                            },
                            not_on_or_after: match attr_value(&e, "NotOnOrAfter") {
                                Some(v) => Some(parse_instant(&v, "NotOnOrAfter")?),
                                None => None,
                            },
                            audiences: Vec::new(),
                        });
                    }
                    "Audience" => in_audience = true,
                    "AuthnStatement" => {
                        let instant = attr_value(&e, "AuthnInstant").ok_or_else(|| {
                            ValidationFailure::missing_field("AuthnStatement AuthnInstant")
                        })?;
                        authn_statement = Some(AuthnStatement {
                            authn_instant: parse_instant(&instant, "AuthnInstant")?,
                            authn_context: None,
                        });
                    }
                    "AuthnContext" => {
                        if let Some(s) = authn_statement.as_mut() {
                            s.authn_context
                                .get_or_insert(AuthnContext { class_ref: None });
                        }
                    }
                    "AuthnContextClassRef" => in_class_ref = true,
                    "AttributeStatement" => saw_attribute_statement = true,
                    "Attribute" => {
                        current_attribute = Some(Attribute {
                            name: attr_value(&e, "Name").unwrap_or_default(),
                            values: Vec::new(),
                        });
                    }
                    "AttributeValue" => in_attribute_value = true,
                    _ => {}
                }
            }
            Event::Text(t) => {
                if in_signature {
                    continue;
                }
                let text = t.unescape().unwrap_or_default().to_string();
                if in_issuer {
                    issuer = Some(text);
                } else if in_name_id {
                    if let Some(s) = subject.as_mut() {
                        s.name_id = Some(NameId {
                            value: text,
                            format: name_id_format.take(),
                        });
                    }
                } else if in_audience {
                    if let Some(c) = conditions.as_mut() {
                        c.audiences.push(text);
                    }
                } else if in_class_ref {
                    if let Some(ctx) = authn_statement
                        .as_mut()
                        .and_then(|s| s.authn_context.as_mut())
                    {
                        ctx.class_ref = Some(text);
                    }
                } else if in_attribute_value {
                    if let Some(a) = current_attribute.as_mut() {
                        a.values.push(text);
                    }
                }
            }
            Event::End(e) => match local_name_of(e.local_name().as_ref()).as_str() {
                "Issuer" => in_issuer = false,
                "Signature" => in_signature = false,
                "NameID" => in_name_id = false,
                "Audience" => in_audience = false,
                "AuthnContextClassRef" => in_class_ref = false,
                "AttributeValue" => in_attribute_value = false,
                "SubjectConfirmation" => {
                    if let (Some(s), Some(c)) = (subject.as_mut(), pending_confirmation.take()) {
                        s.subject_confirmations.push(c);
                    }
                }
                "Attribute" => {
                    if let Some(a) = current_attribute.take() {
                        attributes.push(a);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(ValidationFailure::malformed_input(
            "no Assertion element found",
        ));
    }

    let id = id.ok_or_else(|| ValidationFailure::missing_field("Assertion ID"))?;
    let issuer = issuer.ok_or_else(|| ValidationFailure::missing_field("Issuer"))?;
    let issue_instant = issue_instant
        .ok_or_else(|| ValidationFailure::missing_field("Assertion IssueInstant"))?;

    Ok(Assertion {
        id,
        issue_instant: parse_instant(&issue_instant, "IssueInstant")?,
        issuer,
        issuer_format,
        subject,
        conditions,
        authn_statement,
        attribute_statement: if saw_attribute_statement {
            Some(AttributeStatement { attributes })
        } else {
            None
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{hub_status_codes, status_codes};

    fn parser() -> BoundedParser {
        BoundedParser::new(MessageLimits::default())
    }

    fn sample_response_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
    xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
    ID="_resp1" Version="2.0" IssueInstant="2026-08-01T12:00:00Z"
    InResponseTo="_req1" Destination="https://hub.example.com/acs">
<saml:Issuer>https://msa.example.com</saml:Issuer>
<samlp:Status>
<samlp:StatusCode Value="{}">
<samlp:StatusCode Value="{}"/>
</samlp:StatusCode>
</samlp:Status>
</samlp:Response>"#,
            status_codes::SUCCESS,
            hub_status_codes::MATCH
        )
    }

    #[test]
    fn parses_response_with_nested_status() {
        let raw = RawMessage::response(sample_response_xml());
        let parsed = parser().parse_response(&raw).unwrap();
        let response = parsed.object();

        assert_eq!(response.id, "_resp1");
        assert_eq!(response.issuer, "https://msa.example.com");
        assert_eq!(response.in_response_to.as_deref(), Some("_req1"));
        assert!(response.status.is_success());
        assert_eq!(
            response.status.status_code.sub_status_value(),
            Some(hub_status_codes::MATCH)
        );
    }

    #[test]
    fn parses_base64_encoded_body() {
        let encoded = STANDARD.encode(sample_response_xml());
        let raw = RawMessage::response(encoded);
        let parsed = parser().parse_response(&raw).unwrap();
        assert_eq!(parsed.object().id, "_resp1");
    }

    #[test]
    fn rejects_oversized_input_before_decoding() {
        let limits = MessageLimits {
            response_max_bytes: 64,
            ..MessageLimits::default()
        };
        let raw = RawMessage::response(sample_response_xml());
        let err = BoundedParser::new(limits).parse_response(&raw).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::SizeExceeded);
    }

    #[test]
    fn rejects_garbage_base64() {
        let raw = RawMessage::response("!!!not-base64!!!");
        let err = parser().parse_response(&raw).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::MalformedInput);
    }

    #[test]
    fn rejects_wrong_document_type() {
        let raw = RawMessage::response(
            r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
                 ID="_r" IssueInstant="2026-08-01T12:00:00Z"/>"#,
        );
        let err = parser().parse_response(&raw).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::MalformedInput);
    }

    #[test]
    fn missing_issuer_is_a_missing_field() {
        let raw = RawMessage::response(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
                ID="_resp1" IssueInstant="2026-08-01T12:00:00Z">
               <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
               </samlp:Response>"#,
        );
        let err = parser().parse_response(&raw).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::MissingField);
    }

    #[test]
    fn bad_instant_is_an_illegal_value() {
        let raw = RawMessage::response(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
                xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_resp1" IssueInstant="yesterday">
               <saml:Issuer>https://msa.example.com</saml:Issuer>
               <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
               </samlp:Response>"#,
        );
        let err = parser().parse_response(&raw).unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::IllegalValue);
    }

    #[test]
    fn parses_authn_request() {
        let raw = RawMessage::authn_request(format!(
            r#"<samlp:AuthnRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
                xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_req9" IssueInstant="2026-08-01T12:00:00Z"
                Destination="https://hub.example.com/sso" ForceAuthn="true">
               <saml:Issuer>https://rp.example.com</saml:Issuer>
               <samlp:RequestedAuthnContext>
                 <saml:AuthnContextClassRef>{}</saml:AuthnContextClassRef>
               </samlp:RequestedAuthnContext>
               </samlp:AuthnRequest>"#,
            crate::types::LOA_LEVEL_2
        ));
        let parsed = parser().parse_authn_request(&raw).unwrap();
        let request = parsed.object();
        assert_eq!(request.id, "_req9");
        assert_eq!(request.issuer, "https://rp.example.com");
        assert!(request.force_authn);
        assert_eq!(
            request.requested_level,
            Some(hub_core::LevelOfAssurance::Level2)
        );
    }

    #[test]
    fn parses_assertion_with_statements() {
        let xml = format!(
            r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
                ID="_a1" IssueInstant="2026-08-01T12:00:00Z">
<saml:Issuer Format="urn:oasis:names:tc:SAML:2.0:nameid-format:entity">https://idp.example.com</saml:Issuer>
<saml:Subject>
<saml:NameID Format="urn:oasis:names:tc:SAML:2.0:nameid-format:persistent">_pid7</saml:NameID>
<saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer">
<saml:SubjectConfirmationData InResponseTo="_req1" Recipient="https://hub.example.com/acs"/>
</saml:SubjectConfirmation>
</saml:Subject>
<saml:Conditions NotBefore="2026-08-01T11:55:00Z" NotOnOrAfter="2026-08-01T12:05:00Z">
<saml:AudienceRestriction><saml:Audience>https://hub.example.com</saml:Audience></saml:AudienceRestriction>
</saml:Conditions>
<saml:AuthnStatement AuthnInstant="2026-08-01T11:59:00Z">
<saml:AuthnContext><saml:AuthnContextClassRef>{}</saml:AuthnContextClassRef></saml:AuthnContext>
</saml:AuthnStatement>
</saml:Assertion>"#,
            crate::types::LOA_LEVEL_2
        );
        let parsed = parser().parse_assertion_xml(&xml).unwrap();
        let assertion = parsed.object();

        assert_eq!(assertion.id, "_a1");
        assert_eq!(assertion.issuer, "https://idp.example.com");
        assert_eq!(
            assertion.issuer_format.as_deref(),
            Some("urn:oasis:names:tc:SAML:2.0:nameid-format:entity")
        );
        let subject = assertion.subject.as_ref().unwrap();
        assert_eq!(subject.name_id.as_ref().unwrap().value, "_pid7");
        assert_eq!(subject.subject_confirmations.len(), 1);
        assert_eq!(
            subject.subject_confirmations[0]
                .data
                .as_ref()
                .unwrap()
                .in_response_to
                .as_deref(),
            Some("_req1")
        );
        assert_eq!(
            assertion.conditions.as_ref().unwrap().audiences,
            vec!["https://hub.example.com".to_string()]
        );
        assert_eq!(
            assertion.level_of_assurance(),
            Some(hub_core::LevelOfAssurance::Level2)
        );
    }

    #[test]
    fn parses_encrypted_assertion_blocks() {
        let xml = format!(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol"
    xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion"
    ID="_resp2" IssueInstant="2026-08-01T12:00:00Z">
<saml:Issuer>https://idp.example.com</saml:Issuer>
<samlp:Status><samlp:StatusCode Value="{}"/></samlp:Status>
<saml:EncryptedAssertion>
<xenc:EncryptedData xmlns:xenc="http://www.w3.org/2001/04/xmlenc#">
<xenc:EncryptionMethod Algorithm="http://www.w3.org/2009/xmlenc11#aes256-gcm"/>
<ds:KeyInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
<xenc:EncryptedKey>
<xenc:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p"/>
<xenc:CipherData><xenc:CipherValue>S0VZ</xenc:CipherValue></xenc:CipherData>
</xenc:EncryptedKey>
</ds:KeyInfo>
<xenc:CipherData><xenc:CipherValue>Q09OVEVOVA==</xenc:CipherValue></xenc:CipherData>
</xenc:EncryptedData>
</saml:EncryptedAssertion>
</samlp:Response>"#,
            status_codes::SUCCESS
        );
        let raw = RawMessage::response(xml);
        let parsed = parser().parse_response(&raw).unwrap();
        let response = parsed.object();

        assert_eq!(response.encrypted_assertions.len(), 1);
        let enc = &response.encrypted_assertions[0];
        assert_eq!(
            enc.content_algorithm.as_deref(),
            Some("http://www.w3.org/2009/xmlenc11#aes256-gcm")
        );
        assert_eq!(
            enc.key_algorithm.as_deref(),
            Some("http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p")
        );
        assert_eq!(enc.encrypted_key, "S0VZ");
        assert_eq!(enc.cipher_value, "Q09OVEVOVA==");
    }
}
