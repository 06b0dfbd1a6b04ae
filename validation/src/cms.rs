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

//! Parsed low-level signed-message structure.
//!
//! This crate does not parse CMS itself; the underlying parser is a
//! collaborator whose output is consumed through the types in this module.
//! The model is opaque beyond attribute lookup by identifier, access to raw
//! encoded attribute values, and enumeration of embedded timestamp tokens.

use bcder::{ConstOid, Oid};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{certificate::CertificateToken, digest::IssuerSerialInfo};

/// Attribute identifiers used by the AdES profiles.
pub mod oids {
    use bcder::{ConstOid, Oid};

    /// pkcs9 content-type (1.2.840.113549.1.9.3)
    pub const CONTENT_TYPE: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 3]);

    /// pkcs9 message-digest (1.2.840.113549.1.9.4)
    pub const MESSAGE_DIGEST: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 4]);

    /// pkcs9 signing-time (1.2.840.113549.1.9.5)
    pub const SIGNING_TIME: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 5]);

    /// id-aa-signingCertificate (1.2.840.113549.1.9.16.2.12)
    pub const SIGNING_CERTIFICATE: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 12]);

    /// id-aa-signingCertificateV2 (1.2.840.113549.1.9.16.2.47)
    pub const SIGNING_CERTIFICATE_V2: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 47]);

    /// id-aa-ets-sigPolicyId (1.2.840.113549.1.9.16.2.15)
    pub const SIG_POLICY_ID: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 15]);

    /// id-aa-ets-contentTimestamp (1.2.840.113549.1.9.16.2.20)
    pub const CONTENT_TIMESTAMP: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 20]);

    /// id-aa-signatureTimeStampToken (1.2.840.113549.1.9.16.2.14)
    pub const SIGNATURE_TIMESTAMP: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 14]);

    /// id-aa-ets-certificateRefs (1.2.840.113549.1.9.16.2.21)
    pub const CERTIFICATE_REFS: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 21]);

    /// id-aa-ets-revocationRefs (1.2.840.113549.1.9.16.2.22)
    pub const REVOCATION_REFS: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 22]);

    /// id-aa-ets-certValues (1.2.840.113549.1.9.16.2.23)
    pub const CERT_VALUES: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 23]);

    /// id-aa-ets-revocationValues (1.2.840.113549.1.9.16.2.24)
    pub const REVOCATION_VALUES: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 24]);

    /// id-aa-ets-escTimeStamp (1.2.840.113549.1.9.16.2.25)
    pub const ESC_TIMESTAMP: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 25]);

    /// id-aa-ets-certCRLTimestamp (1.2.840.113549.1.9.16.2.26)
    pub const CERT_CRL_TIMESTAMP: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 26]);

    /// id-aa-ets-attrCertificateRefs (1.2.840.113549.1.9.16.2.44)
    pub const ATTRIBUTE_CERTIFICATE_REFS: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 44]);

    /// id-aa-ets-attrRevocationRefs (1.2.840.113549.1.9.16.2.45)
    pub const ATTRIBUTE_REVOCATION_REFS: ConstOid =
        Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 45]);

    /// id-aa-ets-archiveTimestampV2 (0.4.0.1733.2.4)
    pub const ARCHIVE_TIMESTAMP_V2: ConstOid = Oid(&[4, 0, 141, 69, 2, 4]);

    /// id-aa-ets-archiveTimestampV3 (0.4.0.1733.2.5)
    pub const ARCHIVE_TIMESTAMP_V3: ConstOid = Oid(&[4, 0, 141, 69, 2, 5]);
}

/// A decoded certificate reference as delivered by the low-level parser
/// (an ESS `ESSCertID`/`OtherCertID` equivalent).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateRefData {
    /// OID content octets of the digest algorithm.
    pub digest_algorithm_oid: Vec<u8>,

    /// Digest value over the referenced certificate.
    pub digest_value: Vec<u8>,

    /// Issuer + serial of the referenced certificate, when present.
    pub issuer_serial: Option<IssuerSerialInfo>,
}

/// A digest as delivered by the low-level parser, algorithm still in OID
/// form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DigestData {
    /// OID content octets of the digest algorithm.
    pub algorithm_oid: Vec<u8>,

    /// Digest value.
    pub value: Vec<u8>,
}

/// Decoded complete/attribute revocation references.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RevocationRefsData {
    /// Digest references to CRLs.
    pub crl_refs: Vec<DigestData>,

    /// Digest references to OCSP responses.
    pub ocsp_refs: Vec<DigestData>,
}

/// Decoded revocation-values payload: the embedded revocation objects
/// themselves.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RevocationValuesData {
    /// DER-encoded CRLs.
    pub crls: Vec<Vec<u8>>,

    /// DER-encoded OCSP responses.
    pub ocsps: Vec<Vec<u8>>,
}

/// Decoded signature-policy-identifier payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignaturePolicyIdData {
    /// Policy identifier in dotted-decimal form.
    pub policy_id: String,

    /// Digest of the policy document.
    pub digest: Option<DigestData>,

    /// Policy qualifiers, in declaration order.
    pub qualifiers: Vec<PolicyQualifierData>,
}

/// One signature-policy qualifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PolicyQualifierData {
    /// A URL where the policy document can be obtained.
    Uri(String),

    /// A user notice to display when validating.
    UserNotice(String),

    /// A qualifier this crate does not interpret.
    Unknown {
        /// Qualifier OID in dotted-decimal form.
        oid: String,

        /// String rendering of the qualifier value.
        value: String,
    },
}

/// One attribute value, decoded to the degree the data model requires.
///
/// Values the model inspects byte-wise (times, digests) stay in raw DER
/// form; structured payloads arrive pre-decoded from the parser.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeValue {
    /// Raw DER encoding of the value.
    Der(Vec<u8>),

    /// DER-encoded certificates (cert-values and similar payloads).
    Certificates(Vec<Vec<u8>>),

    /// Certificate references (signing-certificate and
    /// complete/attribute-certificate-references payloads).
    CertificateRefs(Vec<CertificateRefData>),

    /// Embedded revocation objects.
    RevocationValues(RevocationValuesData),

    /// Digest references to revocation objects.
    RevocationRefs(RevocationRefsData),

    /// An encoded timestamp token, to be handed to the [`CmsParser`].
    TimestampToken(Vec<u8>),

    /// Signature policy identifier.
    SignaturePolicyId(SignaturePolicyIdData),
}

/// A signed or unsigned attribute: identifier plus one or more values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    /// Attribute type OID.
    pub typ: Oid<Bytes>,

    /// Attribute values in declaration order.
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    /// Creates an attribute from a known OID constant and its values.
    pub fn new(typ: &ConstOid, values: Vec<AttributeValue>) -> Self {
        Self {
            typ: Oid(Bytes::copy_from_slice(typ.0)),
            values,
        }
    }

    /// Returns the first value, if any.
    pub fn first_value(&self) -> Option<&AttributeValue> {
        self.values.first()
    }
}

/// An ordered attribute table, looked up by identifier.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttributeTable {
    attributes: Vec<Attribute>,
}

impl AttributeTable {
    /// Creates a table from a list of attributes, preserving order.
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Returns the first attribute with the given identifier.
    pub fn get(&self, oid: &ConstOid) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.typ == *oid)
    }

    /// Returns `true` if an attribute with the given identifier is present.
    pub fn contains(&self, oid: &ConstOid) -> bool {
        self.get(oid).is_some()
    }

    /// Iterates over every value of every attribute with the given
    /// identifier, in declaration order.
    pub fn iter_values<'a>(
        &'a self,
        oid: &'a ConstOid,
    ) -> impl Iterator<Item = &'a AttributeValue> {
        self.attributes
            .iter()
            .filter(move |a| a.typ == *oid)
            .flat_map(|a| a.values.iter())
    }
}

/// The signer identifier claimed by a `SignerInfo`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerIdentifier {
    /// Issuer name + serial number.
    IssuerAndSerial(IssuerSerialInfo),

    /// Subject key identifier.
    SubjectKeyIdentifier(Vec<u8>),
}

impl SignerIdentifier {
    /// Returns `true` if this identifier designates the given certificate.
    pub fn matches(&self, token: &CertificateToken) -> bool {
        match self {
            Self::IssuerAndSerial(info) => {
                token.issuer_name_der() == info.issuer_name.as_slice()
                    && token.serial() == info.serial.as_slice()
            }
            Self::SubjectKeyIdentifier(ski) => {
                token.subject_key_identifier() == Some(ski.as_slice())
            }
        }
    }
}

/// One expanded `SignerInfo` block.
#[derive(Clone, Debug)]
pub struct SignerInfo {
    /// The claimed signer identifier.
    pub sid: SignerIdentifier,

    /// OID content octets of the signer's digest algorithm.
    pub digest_algorithm_oid: Vec<u8>,

    /// OID content octets of the signature algorithm.
    pub signature_algorithm_oid: Vec<u8>,

    /// The signature value.
    pub signature: Vec<u8>,

    /// Signed attributes, if present.
    pub signed_attributes: Option<AttributeTable>,

    /// Unsigned attributes, if present.
    pub unsigned_attributes: Option<AttributeTable>,

    /// DER encoding of the signed attributes, the bytes actually covered by
    /// the signature when signed attributes are present.
    pub signed_attributes_der: Option<Vec<u8>>,
}

impl SignerInfo {
    /// Returns the first signed attribute with the given identifier.
    pub fn signed_attribute(&self, oid: &ConstOid) -> Option<&Attribute> {
        self.signed_attributes.as_ref().and_then(|t| t.get(oid))
    }

    /// Returns the first unsigned attribute with the given identifier.
    pub fn unsigned_attribute(&self, oid: &ConstOid) -> Option<&Attribute> {
        self.unsigned_attributes.as_ref().and_then(|t| t.get(oid))
    }
}

/// A parsed signed-message structure, as delivered by the low-level parser.
#[derive(Clone, Debug)]
pub struct CmsSignedData {
    /// OID content octets of the digest algorithms declared at the
    /// signed-data level.
    pub digest_algorithm_oids: Vec<Vec<u8>>,

    /// DER-encoded certificates carried in the structure (the "key info"
    /// location).
    pub certificates: Vec<Vec<u8>>,

    /// Encapsulated content. `None` for a detached signature.
    pub content: Option<Vec<u8>>,

    /// The signer info this validation run is concerned with.
    pub signer: SignerInfo,
}

impl CmsSignedData {
    /// Returns `true` if the signature is detached from its payload.
    pub fn is_detached(&self) -> bool {
        self.content.is_none()
    }
}

/// A decoded timestamp token: the nested signed-data structure plus the
/// fields of its `TSTInfo`.
#[derive(Clone, Debug)]
pub struct ParsedTimestamp {
    /// The timestamp's own signed-data structure.
    pub signed_data: CmsSignedData,

    /// Generation time.
    pub gen_time: DateTime<Utc>,

    /// Message imprint digest.
    pub message_imprint: DigestData,
}

/// The low-level parser collaborator.
///
/// Implementations wrap whatever ASN.1/CMS library the caller uses. A
/// malformed timestamp token must surface as [`CmsParseError::Malformed`];
/// the data model logs it and skips the token without aborting collection.
pub trait CmsParser {
    /// Decodes an embedded timestamp token.
    fn parse_timestamp_token(&self, der: &[u8]) -> Result<ParsedTimestamp, CmsParseError>;
}

/// Describes errors reported by the low-level parser collaborator.
#[derive(Debug, Error)]
pub enum CmsParseError {
    /// The structure could not be decoded.
    #[error("malformed structure ({0})")]
    Malformed(String),
}
