//! XML Signature creation.
//!
//! Signs SAML documents by inserting an enveloped `<ds:Signature>` after the
//! Issuer element of the referenced element.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hub_crypto::SigningCredential;

use crate::error::{SamlResult, ValidationFailure};

use super::{build_signed_info, canonicalize, SignatureAlgorithm};

/// XML document signer.
pub struct XmlSigner {
    credential: SigningCredential,
    algorithm: SignatureAlgorithm,
}

impl XmlSigner {
    /// Creates a signer for the hub's signing credential.
    #[must_use]
    pub fn new(credential: SigningCredential) -> Self {
        Self {
            credential,
            algorithm: SignatureAlgorithm::default(),
        }
    }

    /// Overrides the signature algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Signs an XML document.
    ///
    /// `reference_id` is the ID of the element to sign, without the `#`
    /// prefix. Returns the document with the `<ds:Signature>` inserted
    /// after the element's Issuer.
    pub fn sign(&self, xml: &str, reference_id: &str) -> SamlResult<String> {
        let (element_start, insert_position) = find_element_and_insert_position(xml, reference_id)?;

        let element = extract_element(xml, element_start)?;
        let digest = self.algorithm.digest(canonicalize(&element).as_bytes());
        let digest_b64 = STANDARD.encode(&digest);

        let signed_info = build_signed_info(
            &format!("#{reference_id}"),
            &digest_b64,
            self.algorithm,
        );
        let canonical_signed_info = canonicalize(&signed_info);

        let signature_value = hub_crypto::rsa_sign(
            self.credential.private_key(),
            canonical_signed_info.as_bytes(),
            self.algorithm.rsa_algorithm(),
        )
        .map_err(|e| {
            ValidationFailure::signature_invalid(format!("signing failed: {e}")).with_cause(e)
        })?;
        let signature_b64 = STANDARD.encode(&signature_value);

        let signature_element =
            build_signature_element(&signed_info, &signature_b64, self.credential.certificate());

        Ok(insert_signature(xml, insert_position, &signature_element))
    }
}

/// Finds the referenced element and where to insert the signature.
fn find_element_and_insert_position(xml: &str, reference_id: &str) -> SamlResult<(usize, usize)> {
    let id_pattern = format!("ID=\"{reference_id}\"");

    let element_start = xml.find(&id_pattern).ok_or_else(|| {
        ValidationFailure::signature_invalid(format!(
            "element with ID '{reference_id}' not found"
        ))
    })?;

    // Walk back to the opening '<'.
    let mut tag_start = element_start;
    while tag_start > 0 && xml.as_bytes()[tag_start - 1] != b'<' {
        tag_start -= 1;
    }
    if tag_start > 0 {
        tag_start -= 1;
    }

    let tag_end = xml[element_start..]
        .find('>')
        .map(|pos| element_start + pos + 1)
        .ok_or_else(|| ValidationFailure::malformed_input("malformed XML element"))?;

    // The signature lands after the Issuer element when present.
    let insert_pos = find_issuer_end(xml, tag_end).unwrap_or(tag_end);

    Ok((tag_start, insert_pos))
}

/// Finds the end of the Issuer element after the given position.
fn find_issuer_end(xml: &str, after: usize) -> Option<usize> {
    let search_area = &xml[after..];
    for pattern in &["</saml:Issuer>", "</Issuer>", "</saml2:Issuer>"] {
        if let Some(pos) = search_area.find(pattern) {
            return Some(after + pos + pattern.len());
        }
    }
    None
}

/// Extracts a complete XML element starting at the given position.
pub(crate) fn extract_element(xml: &str, start: usize) -> SamlResult<String> {
    let xml_bytes = xml.as_bytes();

    let mut tag_end = start + 1;
    while tag_end < xml.len() && xml_bytes[tag_end] != b' ' && xml_bytes[tag_end] != b'>' {
        tag_end += 1;
    }
    let full_tag_name = &xml[start + 1..tag_end];

    let close_pattern = format!("</{full_tag_name}>");
    if let Some(close_pos) = xml[start..].find(&close_pattern) {
        let end_pos = start + close_pos + close_pattern.len();
        return Ok(xml[start..end_pos].to_string());
    }

    // Fall back to the local name when the closing tag drops the prefix.
    let tag_name = full_tag_name.split(':').next_back().unwrap_or(full_tag_name);
    let close_pattern = format!("</{tag_name}");
    let close_pos = xml[start..].find(&close_pattern).ok_or_else(|| {
        ValidationFailure::malformed_input(format!("unclosed XML element '{full_tag_name}'"))
    })?;
    let end_pos = xml[start + close_pos..]
        .find('>')
        .map(|pos| start + close_pos + pos + 1)
        .ok_or_else(|| ValidationFailure::malformed_input("malformed closing tag"))?;

    Ok(xml[start..end_pos].to_string())
}

/// Builds the complete Signature element.
fn build_signature_element(
    signed_info: &str,
    signature_value: &str,
    certificate_der: Option<&[u8]>,
) -> String {
    let mut signature = format!(
        r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
{signed_info}
<ds:SignatureValue>{signature_value}</ds:SignatureValue>"#
    );

    if let Some(cert) = certificate_der {
        let cert_b64 = STANDARD.encode(cert);
        signature.push_str(&format!(
            r#"
<ds:KeyInfo>
<ds:X509Data>
<ds:X509Certificate>{cert_b64}</ds:X509Certificate>
</ds:X509Data>
</ds:KeyInfo>"#
        ));
    }

    signature.push_str("\n</ds:Signature>");
    signature
}

/// Inserts the signature into the XML document.
fn insert_signature(xml: &str, position: usize, signature: &str) -> String {
    format!("{}{}{}", &xml[..position], signature, &xml[position..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_element_handles_prefixed_close() {
        let xml = r#"<samlp:Response ID="_r1"><saml:Issuer>x</saml:Issuer></samlp:Response>"#;
        let element = extract_element(xml, 0).unwrap();
        assert_eq!(element, xml);
    }

    #[test]
    fn signature_lands_after_issuer() {
        let xml = r#"<samlp:Response ID="_r1"><saml:Issuer>hub</saml:Issuer><samlp:Status/></samlp:Response>"#;
        let (_, insert) = find_element_and_insert_position(xml, "_r1").unwrap();
        assert_eq!(&xml[insert - "</saml:Issuer>".len()..insert], "</saml:Issuer>");
    }

    #[test]
    fn unknown_reference_id_is_an_error() {
        let xml = r#"<samlp:Response ID="_r1"/>"#;
        assert!(find_element_and_insert_position(xml, "_other").is_err());
    }
}
