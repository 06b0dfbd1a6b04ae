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

//! Timestamp tokens embedded in a signature and the references describing
//! what each one covers.

use ades_status_tracker::{log_item, validation_codes, StatusTracker};
use chrono::{DateTime, Utc};

use crate::{
    certificate::{CertificatePool, EmbeddedCertificateSource},
    cms::{oids, AttributeValue, CmsParser, DigestData, ParsedTimestamp},
    digest::DigestAlgorithm,
    revocation::{crl::SignatureCrlSource, ocsp::SignatureOcspSource},
};

/// The role a timestamp token plays within its signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimestampType {
    /// Covers the signed content, proving it existed before signing.
    ContentTimestamp,

    /// Covers the signature value.
    SignatureTimestamp,

    /// Covers the signature plus complete certificate and revocation
    /// references (the certs-and-CRLs timestamp).
    ValidationDataTimestamp,

    /// Covers the signature, its timestamp, and the complete references
    /// (the escape timestamp).
    SigAndRefsTimestamp,

    /// Covers the complete references only.
    RefsOnlyTimestamp,

    /// Archive timestamp, version 2.
    ArchiveTimestampV2,

    /// Archive timestamp, version 3.
    ArchiveTimestampV3,

    /// A PDF document timestamp covering the whole revision.
    DocumentTimestamp,
}

impl TimestampType {
    /// Returns `true` for either archive timestamp version.
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::ArchiveTimestampV2 | Self::ArchiveTimestampV3)
    }
}

/// The kind of object a timestamp covers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimestampedObjectType {
    /// The signature itself.
    SignedData,

    /// A certificate token.
    Certificate,

    /// A CRL or OCSP binary.
    Revocation,

    /// Another timestamp token.
    Timestamp,
}

/// One object covered by a timestamp: its kind plus the object identifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimestampedReference {
    /// The kind of covered object.
    pub object_type: TimestampedObjectType,

    /// Identifier of the covered object.
    pub object_id: String,
}

impl TimestampedReference {
    /// Creates a reference to an object.
    pub fn new(object_type: TimestampedObjectType, object_id: impl Into<String>) -> Self {
        Self {
            object_type,
            object_id: object_id.into(),
        }
    }
}

/// Builds the ordered, duplicate-free reference list a new archive
/// timestamp must cover: everything covered by the signature's own
/// timestamp references, every previously existing timestamp (each with
/// its own coverage set), and the signature's directly timestamped
/// references.
pub fn references_for_archive_timestamp(
    signature_references: &[TimestampedReference],
    previous_timestamps: &[&TimestampToken],
    direct_references: &[TimestampedReference],
) -> Vec<TimestampedReference> {
    let mut references: Vec<TimestampedReference> = Vec::new();

    let push = |r: TimestampedReference, refs: &mut Vec<TimestampedReference>| {
        if !refs.contains(&r) {
            refs.push(r);
        }
    };

    for r in signature_references {
        push(r.clone(), &mut references);
    }

    for ts in previous_timestamps {
        push(
            TimestampedReference::new(TimestampedObjectType::Timestamp, ts.id()),
            &mut references,
        );

        for r in ts.timestamped_references() {
            push(r.clone(), &mut references);
        }
    }

    for r in direct_references {
        push(r.clone(), &mut references);
    }

    references
}

/// A decoded timestamp token, independently queryable: it has its own
/// certificate and revocation sources, drawn from the token's nested
/// signed-data structure.
#[derive(Debug)]
pub struct TimestampToken {
    id: String,
    encoded: Vec<u8>,
    ts_type: TimestampType,
    gen_time: DateTime<Utc>,
    message_imprint: DigestData,
    certificate_source: EmbeddedCertificateSource,
    crl_source: SignatureCrlSource,
    ocsp_source: SignatureOcspSource,
    timestamped_references: Vec<TimestampedReference>,
}

impl TimestampToken {
    /// Builds a token from its encoding and the parser's decoded view.
    pub fn new(
        encoded: Vec<u8>,
        ts_type: TimestampType,
        parsed: &ParsedTimestamp,
        pool: &CertificatePool,
        tracker: &mut StatusTracker,
    ) -> Self {
        Self {
            id: hex::encode(DigestAlgorithm::Sha256.digest(&encoded)),
            ts_type,
            gen_time: parsed.gen_time,
            message_imprint: parsed.message_imprint.clone(),
            certificate_source: EmbeddedCertificateSource::from_cms(
                &parsed.signed_data,
                pool,
                tracker,
            ),
            crl_source: SignatureCrlSource::from_timestamp(&parsed.signed_data, tracker),
            ocsp_source: SignatureOcspSource::from_timestamp(&parsed.signed_data, tracker),
            timestamped_references: Vec::new(),
            encoded,
        }
    }

    /// Returns the token identifier (hex-encoded SHA-256 of the encoding).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the encoded token.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Returns the role this token plays within its signature.
    pub fn ts_type(&self) -> TimestampType {
        self.ts_type
    }

    /// Returns the generation time asserted by the timestamp authority.
    pub fn gen_time(&self) -> DateTime<Utc> {
        self.gen_time
    }

    /// Returns the message imprint, algorithm still in OID form.
    pub fn message_imprint(&self) -> &DigestData {
        &self.message_imprint
    }

    /// Returns the token's own certificate source.
    pub fn certificate_source(&self) -> &EmbeddedCertificateSource {
        &self.certificate_source
    }

    /// Returns the token's own CRL source.
    pub fn crl_source(&self) -> &SignatureCrlSource {
        &self.crl_source
    }

    /// Returns the token's own OCSP source.
    pub fn ocsp_source(&self) -> &SignatureOcspSource {
        &self.ocsp_source
    }

    /// Returns the objects this token covers.
    pub fn timestamped_references(&self) -> &[TimestampedReference] {
        &self.timestamped_references
    }

    /// Records the objects this token covers.
    pub fn set_timestamped_references(&mut self, references: Vec<TimestampedReference>) {
        self.timestamped_references = references;
    }

    /// Returns `true` when the message imprint is the digest of `data`
    /// under the imprint's own algorithm. An unsupported imprint algorithm
    /// is logged and reported as a mismatch.
    pub fn matches_data(&self, data: &[u8], tracker: &mut StatusTracker) -> bool {
        match DigestAlgorithm::from_oid(&self.message_imprint.algorithm_oid) {
            Ok(algorithm) => algorithm.digest(data) == self.message_imprint.value,
            Err(err) => {
                log::warn!("timestamp {} message imprint: {err}", self.id);

                log_item!(
                    "time_stamp",
                    "message imprint uses an unsupported digest algorithm",
                    "matches_data"
                )
                .validation_status(validation_codes::REF_UNSUPPORTED_ALGORITHM)
                .informational(tracker);

                false
            }
        }
    }
}

/// Every timestamp token found in one signature, grouped by role.
#[derive(Debug, Default)]
pub struct SignatureTimestampSource {
    content_timestamps: Vec<TimestampToken>,
    signature_timestamps: Vec<TimestampToken>,
    validation_data_timestamps: Vec<TimestampToken>,
    sig_and_refs_timestamps: Vec<TimestampToken>,
    refs_only_timestamps: Vec<TimestampToken>,
    archive_timestamps: Vec<TimestampToken>,
    document_timestamps: Vec<TimestampToken>,
}

impl SignatureTimestampSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populates a source from a CMS signed-data structure.
    ///
    /// `signature_id` seeds the coverage set of signature timestamps;
    /// `direct_references` are the signature's directly timestamped objects
    /// (certificates and revocation binaries gathered at top level), folded
    /// into each archive timestamp's coverage.
    pub fn from_cms(
        cms: &crate::cms::CmsSignedData,
        signature_id: &str,
        direct_references: &[TimestampedReference],
        parser: &dyn CmsParser,
        pool: &CertificatePool,
        tracker: &mut StatusTracker,
    ) -> Self {
        let mut source = Self::default();

        let signature_reference =
            TimestampedReference::new(TimestampedObjectType::SignedData, signature_id);

        if let Some(table) = &cms.signer.signed_attributes {
            for value in table.iter_values(&oids::CONTENT_TIMESTAMP) {
                if let Some(token) = source.decode_token(
                    value,
                    TimestampType::ContentTimestamp,
                    parser,
                    pool,
                    tracker,
                ) {
                    source.content_timestamps.push(token);
                }
            }
        }

        let Some(table) = &cms.signer.unsigned_attributes else {
            return source;
        };

        for value in table.iter_values(&oids::SIGNATURE_TIMESTAMP) {
            if let Some(mut token) = source.decode_token(
                value,
                TimestampType::SignatureTimestamp,
                parser,
                pool,
                tracker,
            ) {
                token.set_timestamped_references(vec![signature_reference.clone()]);
                source.signature_timestamps.push(token);
            }
        }

        for value in table.iter_values(&oids::CERT_CRL_TIMESTAMP) {
            if let Some(token) = source.decode_token(
                value,
                TimestampType::ValidationDataTimestamp,
                parser,
                pool,
                tracker,
            ) {
                source.validation_data_timestamps.push(token);
            }
        }

        for value in table.iter_values(&oids::ESC_TIMESTAMP) {
            if let Some(token) = source.decode_token(
                value,
                TimestampType::SigAndRefsTimestamp,
                parser,
                pool,
                tracker,
            ) {
                source.sig_and_refs_timestamps.push(token);
            }
        }

        for (oid, ts_type) in [
            (&oids::ARCHIVE_TIMESTAMP_V2, TimestampType::ArchiveTimestampV2),
            (&oids::ARCHIVE_TIMESTAMP_V3, TimestampType::ArchiveTimestampV3),
        ] {
            for value in table.iter_values(oid) {
                if let Some(mut token) =
                    source.decode_token(value, ts_type, parser, pool, tracker)
                {
                    let previous: Vec<&TimestampToken> = source.all();
                    token.set_timestamped_references(references_for_archive_timestamp(
                        &[signature_reference.clone()],
                        &previous,
                        direct_references,
                    ));
                    source.archive_timestamps.push(token);
                }
            }
        }

        source
    }

    fn decode_token(
        &self,
        value: &AttributeValue,
        ts_type: TimestampType,
        parser: &dyn CmsParser,
        pool: &CertificatePool,
        tracker: &mut StatusTracker,
    ) -> Option<TimestampToken> {
        let AttributeValue::TimestampToken(der) = value else {
            return None;
        };

        match parser.parse_timestamp_token(der) {
            Ok(parsed) => {
                let token = TimestampToken::new(der.clone(), ts_type, &parsed, pool, tracker);

                log_item!("time_stamp", "timestamp token collected", "decode_token")
                    .validation_status(validation_codes::TIMESTAMP_COLLECTED)
                    .success(tracker);

                Some(token)
            }
            Err(err) => {
                log::warn!("skipping malformed timestamp token: {err}");

                log_item!(
                    "time_stamp",
                    "skipping malformed timestamp token",
                    "decode_token"
                )
                .validation_status(validation_codes::TIMESTAMP_MALFORMED)
                .failure_no_throw(tracker, err);

                None
            }
        }
    }

    /// Adds a content timestamp.
    pub fn push_content_timestamp(&mut self, token: TimestampToken) {
        self.content_timestamps.push(token);
    }

    /// Adds a signature timestamp.
    pub fn push_signature_timestamp(&mut self, token: TimestampToken) {
        self.signature_timestamps.push(token);
    }

    /// Adds a certs-and-CRLs timestamp.
    pub fn push_validation_data_timestamp(&mut self, token: TimestampToken) {
        self.validation_data_timestamps.push(token);
    }

    /// Adds an escape timestamp.
    pub fn push_sig_and_refs_timestamp(&mut self, token: TimestampToken) {
        self.sig_and_refs_timestamps.push(token);
    }

    /// Adds a refs-only timestamp.
    pub fn push_refs_only_timestamp(&mut self, token: TimestampToken) {
        self.refs_only_timestamps.push(token);
    }

    /// Adds an archive timestamp.
    pub fn push_archive_timestamp(&mut self, token: TimestampToken) {
        self.archive_timestamps.push(token);
    }

    /// Adds a PDF document timestamp.
    pub fn push_document_timestamp(&mut self, token: TimestampToken) {
        self.document_timestamps.push(token);
    }

    /// Content timestamps, in declaration order.
    pub fn content_timestamps(&self) -> &[TimestampToken] {
        &self.content_timestamps
    }

    /// Signature timestamps, in declaration order.
    pub fn signature_timestamps(&self) -> &[TimestampToken] {
        &self.signature_timestamps
    }

    /// Certs-and-CRLs timestamps, in declaration order.
    pub fn validation_data_timestamps(&self) -> &[TimestampToken] {
        &self.validation_data_timestamps
    }

    /// Escape timestamps, in declaration order.
    pub fn sig_and_refs_timestamps(&self) -> &[TimestampToken] {
        &self.sig_and_refs_timestamps
    }

    /// Refs-only timestamps, in declaration order.
    pub fn refs_only_timestamps(&self) -> &[TimestampToken] {
        &self.refs_only_timestamps
    }

    /// Archive timestamps (both versions), in declaration order.
    pub fn archive_timestamps(&self) -> &[TimestampToken] {
        &self.archive_timestamps
    }

    /// PDF document timestamps, in declaration order.
    pub fn document_timestamps(&self) -> &[TimestampToken] {
        &self.document_timestamps
    }

    /// Returns every timestamp, grouped by role in evaluation order.
    pub fn all(&self) -> Vec<&TimestampToken> {
        self.content_timestamps
            .iter()
            .chain(&self.signature_timestamps)
            .chain(&self.validation_data_timestamps)
            .chain(&self.sig_and_refs_timestamps)
            .chain(&self.refs_only_timestamps)
            .chain(&self.archive_timestamps)
            .chain(&self.document_timestamps)
            .collect()
    }
}
