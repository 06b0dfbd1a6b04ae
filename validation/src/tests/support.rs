// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Shared fixtures and stub collaborators for the validation tests.

use std::{collections::HashMap, sync::Arc};

use bcder::ConstOid;
use chrono::{DateTime, TimeZone, Utc};

use crate::{
    certificate::CertificateToken,
    cms::{
        oids, Attribute, AttributeTable, AttributeValue, CertificateRefData, CmsParseError,
        CmsParser, CmsSignedData, DigestData, ParsedTimestamp, RevocationValuesData,
        SignerIdentifier, SignerInfo,
    },
    context::ValidationContext,
    digest::{DigestAlgorithm, IssuerSerialInfo, SHA256_OID},
    raw_signature::{RawSignatureValidationError, RawSignatureValidator},
    signature::CadesSignature,
};

pub(crate) const CA_DER: &[u8] = include_bytes!("fixtures/ca.der");
pub(crate) const SIGNER_DER: &[u8] = include_bytes!("fixtures/signer.der");
pub(crate) const OTHER_DER: &[u8] = include_bytes!("fixtures/other.der");

pub(crate) fn signer_token() -> CertificateToken {
    CertificateToken::from_der(SIGNER_DER).unwrap()
}

pub(crate) fn fixed_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
}

pub(crate) fn sid_for(token: &CertificateToken) -> SignerIdentifier {
    SignerIdentifier::IssuerAndSerial(IssuerSerialInfo {
        issuer_name: token.issuer_name_der().to_vec(),
        serial: token.serial().to_vec(),
    })
}

pub(crate) fn signer_info(sid: SignerIdentifier) -> SignerInfo {
    SignerInfo {
        sid,
        digest_algorithm_oid: SHA256_OID.0.to_vec(),
        signature_algorithm_oid: vec![42, 134, 72, 206, 61, 4, 3, 2],
        signature: b"signature-value".to_vec(),
        signed_attributes: None,
        unsigned_attributes: None,
        signed_attributes_der: None,
    }
}

pub(crate) fn cms(
    certificates: Vec<Vec<u8>>,
    content: Option<Vec<u8>>,
    signer: SignerInfo,
) -> CmsSignedData {
    CmsSignedData {
        digest_algorithm_oids: vec![SHA256_OID.0.to_vec()],
        certificates,
        content,
        signer,
    }
}

pub(crate) fn empty_cms() -> CmsSignedData {
    cms(
        Vec::new(),
        None,
        signer_info(SignerIdentifier::SubjectKeyIdentifier(b"tsa".to_vec())),
    )
}

pub(crate) fn attr(oid: &ConstOid, values: Vec<AttributeValue>) -> Attribute {
    Attribute::new(oid, values)
}

pub(crate) fn set_signed_attrs(signer: &mut SignerInfo, attrs: Vec<Attribute>) {
    signer.signed_attributes = Some(AttributeTable::new(attrs));
}

pub(crate) fn set_unsigned_attrs(signer: &mut SignerInfo, attrs: Vec<Attribute>) {
    signer.unsigned_attributes = Some(AttributeTable::new(attrs));
}

pub(crate) fn cert_ref_data(
    token: &CertificateToken,
    algorithm: DigestAlgorithm,
) -> CertificateRefData {
    CertificateRefData {
        digest_algorithm_oid: algorithm.oid().to_vec(),
        digest_value: token.digest(algorithm),
        issuer_serial: None,
    }
}

pub(crate) fn signing_cert_attr(refs: Vec<CertificateRefData>) -> Attribute {
    attr(
        &oids::SIGNING_CERTIFICATE,
        vec![AttributeValue::CertificateRefs(refs)],
    )
}

pub(crate) fn revocation_values_attr(crls: Vec<Vec<u8>>, ocsps: Vec<Vec<u8>>) -> Attribute {
    attr(
        &oids::REVOCATION_VALUES,
        vec![AttributeValue::RevocationValues(RevocationValuesData {
            crls,
            ocsps,
        })],
    )
}

pub(crate) fn message_digest_attr(content: &[u8]) -> Attribute {
    let digest = DigestAlgorithm::Sha256.digest(content);
    attr(
        &oids::MESSAGE_DIGEST,
        vec![AttributeValue::Der(der_octet_string(&digest))],
    )
}

pub(crate) fn der_octet_string(bytes: &[u8]) -> Vec<u8> {
    assert!(bytes.len() < 128);
    let mut der = vec![0x04, bytes.len() as u8];
    der.extend_from_slice(bytes);
    der
}

pub(crate) fn der_utc_time(s: &str) -> Vec<u8> {
    let mut der = vec![0x17, s.len() as u8];
    der.extend_from_slice(s.as_bytes());
    der
}

pub(crate) fn der_generalized_time(s: &str) -> Vec<u8> {
    let mut der = vec![0x18, s.len() as u8];
    der.extend_from_slice(s.as_bytes());
    der
}

/// Parser stub: hands back a pre-registered signed-data structure per
/// encoded token, or an empty one. Any encoding starting with `bad` is
/// reported as malformed.
#[derive(Default)]
pub(crate) struct StubParser {
    tokens: HashMap<Vec<u8>, CmsSignedData>,
}

impl StubParser {
    pub(crate) fn with_token(mut self, encoded: &[u8], signed_data: CmsSignedData) -> Self {
        self.tokens.insert(encoded.to_vec(), signed_data);
        self
    }
}

impl CmsParser for StubParser {
    fn parse_timestamp_token(&self, der: &[u8]) -> Result<ParsedTimestamp, CmsParseError> {
        if der.starts_with(b"bad") {
            return Err(CmsParseError::Malformed("stub".to_string()));
        }

        Ok(ParsedTimestamp {
            signed_data: self.tokens.get(der).cloned().unwrap_or_else(empty_cms),
            gen_time: fixed_time(),
            message_imprint: DigestData {
                algorithm_oid: SHA256_OID.0.to_vec(),
                value: DigestAlgorithm::Sha256.digest(b"imprint"),
            },
        })
    }
}

/// Validator stub with a fixed verdict.
pub(crate) struct StubValidator {
    pub(crate) ok: bool,
}

impl RawSignatureValidator for StubValidator {
    fn validate(
        &self,
        _sig: &[u8],
        _data: &[u8],
        _public_key_der: &[u8],
    ) -> Result<(), RawSignatureValidationError> {
        if self.ok {
            Ok(())
        } else {
            Err(RawSignatureValidationError::SignatureMismatch)
        }
    }
}

pub(crate) fn cades(signed_data: CmsSignedData) -> CadesSignature {
    cades_with_parser(signed_data, StubParser::default())
}

pub(crate) fn cades_with_parser(signed_data: CmsSignedData, parser: StubParser) -> CadesSignature {
    CadesSignature::new(
        signed_data,
        Arc::new(parser),
        Arc::new(ValidationContext::new()),
    )
}
