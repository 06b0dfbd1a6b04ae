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

//! OCSP evidence: binaries, parsed tokens, digest references, and the
//! per-signature OCSP source that classifies them by origin.

use std::collections::HashMap;

use ades_status_tracker::{log_item, validation_codes, StatusTracker};
use rasn_ocsp::{BasicOcspResponse, OcspResponseStatus};

use super::{RevocationOrigin, RevocationRefLocation};
use crate::{
    cms::{oids, AttributeTable, AttributeValue, CmsParser, CmsSignedData, RevocationValuesData},
    digest::{Digest, DigestAlgorithm},
};

/// One embedded OCSP response in encoded form, with every origin it was
/// found in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspBinary {
    id: String,
    bytes: Vec<u8>,
    origins: Vec<RevocationOrigin>,
}

impl OcspBinary {
    /// Wraps an encoded OCSP response found at `origin`.
    pub fn new(bytes: Vec<u8>, origin: RevocationOrigin) -> Self {
        Self {
            id: hex::encode(DigestAlgorithm::Sha256.digest(&bytes)),
            bytes,
            origins: vec![origin],
        }
    }

    /// Returns the binary identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the encoded response.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns every origin this response was found in.
    pub fn origins(&self) -> &[RevocationOrigin] {
        &self.origins
    }

    /// Records an additional origin for the same encoding.
    pub fn add_origin(&mut self, origin: RevocationOrigin) {
        if !self.origins.contains(&origin) {
            self.origins.push(origin);
        }
    }

    /// Computes the digest of the encoding under `algorithm`.
    pub fn digest_value(&self, algorithm: DigestAlgorithm) -> Vec<u8> {
        algorithm.digest(&self.bytes)
    }
}

/// Summary fields of a parsed, successful OCSP response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspSummary {
    /// Time the response was produced (seconds since the Unix epoch).
    pub produced_at: i64,

    /// Number of single responses carried.
    pub single_responses: usize,
}

/// An OCSP token: a parsed view over a registered [`OcspBinary`].
///
/// An unparsable or unsuccessful response still yields a token (with no
/// summary) so that the evidence remains reportable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspToken {
    binary_id: String,
    summary: Option<OcspSummary>,
}

impl OcspToken {
    /// Parses a token from the binary with identifier `binary_id`.
    pub fn parse(binary_id: &str, bytes: &[u8]) -> Self {
        Self {
            binary_id: binary_id.to_owned(),
            summary: parse_summary(bytes),
        }
    }

    /// Returns the identifier of the binary this token was parsed from.
    pub fn binary_id(&self) -> &str {
        &self.binary_id
    }

    /// Returns the parsed summary, or `None` if the response was
    /// unparsable or not successful.
    pub fn summary(&self) -> Option<&OcspSummary> {
        self.summary.as_ref()
    }
}

fn parse_summary(bytes: &[u8]) -> Option<OcspSummary> {
    let response = rasn::der::decode::<rasn_ocsp::OcspResponse>(bytes).ok()?;

    if response.status != OcspResponseStatus::Successful {
        return None;
    }

    let response_bytes = response.bytes?;
    let basic = rasn::der::decode::<BasicOcspResponse>(&response_bytes.response).ok()?;

    Some(OcspSummary {
        produced_at: basic.tbs_response_data.produced_at.timestamp(),
        single_responses: basic.tbs_response_data.responses.len(),
    })
}

/// A digest-based pointer to an OCSP response that may or may not resolve
/// to an embedded binary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspRef {
    /// Digest over the referenced response's encoding.
    pub digest: Digest,

    /// Where the reference was declared.
    pub location: RevocationRefLocation,
}

/// The OCSP evidence one signature carries, classified by origin.
///
/// Mirrors [`SignatureCrlSource`](super::crl::SignatureCrlSource): binaries
/// register once per distinct encoding, tokens attach to registered
/// binaries, references live in three location lists.
#[derive(Debug, Default)]
pub struct SignatureOcspSource {
    binaries: Vec<OcspBinary>,
    tokens: HashMap<String, Vec<OcspToken>>,

    revocation_values_tokens: Vec<OcspToken>,
    attribute_revocation_values_tokens: Vec<OcspToken>,
    timestamp_revocation_values_tokens: Vec<OcspToken>,
    dss_dictionary_tokens: Vec<OcspToken>,
    vri_dictionary_tokens: Vec<OcspToken>,

    complete_refs: Vec<OcspRef>,
    attribute_refs: Vec<OcspRef>,
    timestamp_refs: Vec<OcspRef>,
}

impl SignatureOcspSource {
    /// Populates a source from a CMS signed-data structure, including the
    /// revocation data sealed inside its timestamp tokens.
    pub fn from_cms(
        cms: &CmsSignedData,
        parser: &dyn CmsParser,
        tracker: &mut StatusTracker,
    ) -> Self {
        let mut source = Self::default();

        if let Some(table) = &cms.signer.unsigned_attributes {
            source.collect_values_from_table(
                table,
                &oids::REVOCATION_VALUES,
                RevocationOrigin::RevocationValues,
            );

            source.collect_refs_from_table(
                table,
                &oids::REVOCATION_REFS,
                RevocationRefLocation::CompleteRevocationRefs,
                tracker,
            );

            source.collect_refs_from_table(
                table,
                &oids::ATTRIBUTE_REVOCATION_REFS,
                RevocationRefLocation::AttributeRevocationRefs,
                tracker,
            );
        }

        source.collect_timestamp_data(cms, parser, tracker);
        source
    }

    /// Populates a source from a timestamp token's own signed-data
    /// structure.
    pub fn from_timestamp(cms: &CmsSignedData, tracker: &mut StatusTracker) -> Self {
        let mut source = Self::default();

        if let Some(table) = &cms.signer.unsigned_attributes {
            source.collect_values_from_table(
                table,
                &oids::REVOCATION_VALUES,
                RevocationOrigin::TimestampRevocationValues,
            );

            source.collect_refs_from_table(
                table,
                &oids::REVOCATION_REFS,
                RevocationRefLocation::TimestampRevocationRefs,
                tracker,
            );

            source.collect_refs_from_table(
                table,
                &oids::ATTRIBUTE_REVOCATION_REFS,
                RevocationRefLocation::TimestampRevocationRefs,
                tracker,
            );
        }

        source
    }

    /// Registers an encoded OCSP response found at `origin`, returning its
    /// binary identifier.
    pub fn add_ocsp_binary(&mut self, bytes: Vec<u8>, origin: RevocationOrigin) -> String {
        let binary = OcspBinary::new(bytes, origin);

        if let Some(existing) = self.binaries.iter_mut().find(|b| b.id() == binary.id()) {
            existing.add_origin(origin);
            return existing.id().to_owned();
        }

        let id = binary.id().to_owned();
        self.binaries.push(binary);
        id
    }

    /// Attaches a parsed token to an already-registered binary and files it
    /// under every origin the binary was found in.
    ///
    /// A token whose binary identifier was never registered is dropped.
    pub fn store_ocsp_token(&mut self, binary_id: &str, token: OcspToken) {
        let Some(binary) = self.binaries.iter().find(|b| b.id() == binary_id) else {
            log::debug!("dropping OCSP token with unregistered binary identifier {binary_id}");
            return;
        };

        let origins = binary.origins().to_vec();

        let entry = self.tokens.entry(binary_id.to_owned()).or_default();
        if !entry.contains(&token) {
            entry.push(token.clone());
        }

        for origin in origins {
            let list = match origin {
                RevocationOrigin::RevocationValues => &mut self.revocation_values_tokens,
                RevocationOrigin::AttributeRevocationValues => {
                    &mut self.attribute_revocation_values_tokens
                }
                RevocationOrigin::TimestampRevocationValues => {
                    &mut self.timestamp_revocation_values_tokens
                }
                RevocationOrigin::DssDictionary => &mut self.dss_dictionary_tokens,
                RevocationOrigin::VriDictionary => &mut self.vri_dictionary_tokens,
            };

            if !list.contains(&token) {
                list.push(token.clone());
            }
        }
    }

    /// Classifies a reference into its location list.
    ///
    /// As with CRL references, a reference declared in
    /// attribute-revocation-references is also filed under
    /// timestamp-revocation-references.
    pub fn add_reference(&mut self, r: OcspRef) {
        match r.location {
            RevocationRefLocation::CompleteRevocationRefs => {
                if !self.complete_refs.contains(&r) {
                    self.complete_refs.push(r);
                }
            }
            RevocationRefLocation::AttributeRevocationRefs => {
                if !self.attribute_refs.contains(&r) {
                    self.attribute_refs.push(r.clone());
                }
                if !self.timestamp_refs.contains(&r) {
                    self.timestamp_refs.push(r);
                }
            }
            RevocationRefLocation::TimestampRevocationRefs => {
                if !self.timestamp_refs.contains(&r) {
                    self.timestamp_refs.push(r);
                }
            }
        }
    }

    /// Merges a nested (timestamp-scoped) source's binaries, tokens, and
    /// references into this one, preserving per-origin attribution.
    pub fn add_values_from_inner_source(&mut self, inner: &SignatureOcspSource) {
        for binary in &inner.binaries {
            let mut id = String::new();
            for origin in binary.origins() {
                id = self.add_ocsp_binary(binary.bytes().to_vec(), *origin);
            }

            for token in inner.tokens_for(binary.id()) {
                self.store_ocsp_token(&id, token.clone());
            }
        }

        for r in inner.all_references() {
            let list = match r.location {
                RevocationRefLocation::CompleteRevocationRefs => &mut self.complete_refs,
                RevocationRefLocation::AttributeRevocationRefs => &mut self.attribute_refs,
                RevocationRefLocation::TimestampRevocationRefs => &mut self.timestamp_refs,
            };

            if !list.contains(r) {
                list.push(r.clone());
            }
        }
    }

    /// Returns every registered binary.
    pub fn binaries(&self) -> &[OcspBinary] {
        &self.binaries
    }

    /// Returns the tokens attached to the binary with identifier `id`.
    pub fn tokens_for(&self, id: &str) -> &[OcspToken] {
        self.tokens.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tokens whose binary appeared in the revocation-values attribute.
    pub fn revocation_values_tokens(&self) -> &[OcspToken] {
        &self.revocation_values_tokens
    }

    /// Tokens whose binary appeared in an attribute-revocation-values
    /// element.
    pub fn attribute_revocation_values_tokens(&self) -> &[OcspToken] {
        &self.attribute_revocation_values_tokens
    }

    /// Tokens whose binary was sealed inside a timestamp token.
    pub fn timestamp_revocation_values_tokens(&self) -> &[OcspToken] {
        &self.timestamp_revocation_values_tokens
    }

    /// Tokens whose binary appeared in a PDF DSS dictionary.
    pub fn dss_dictionary_tokens(&self) -> &[OcspToken] {
        &self.dss_dictionary_tokens
    }

    /// Tokens whose binary appeared in a PDF VRI dictionary.
    pub fn vri_dictionary_tokens(&self) -> &[OcspToken] {
        &self.vri_dictionary_tokens
    }

    /// References from the complete-revocation-references attribute.
    pub fn complete_refs(&self) -> &[OcspRef] {
        &self.complete_refs
    }

    /// References from the attribute-revocation-references attribute.
    pub fn attribute_refs(&self) -> &[OcspRef] {
        &self.attribute_refs
    }

    /// References declared inside timestamp tokens.
    pub fn timestamp_refs(&self) -> &[OcspRef] {
        &self.timestamp_refs
    }

    /// Returns every reference across the three location lists.
    pub fn all_references(&self) -> impl Iterator<Item = &OcspRef> {
        self.complete_refs
            .iter()
            .chain(&self.attribute_refs)
            .chain(&self.timestamp_refs)
    }

    /// Returns every reference that designates `binary`.
    pub fn references_for_ocsp_binary(&self, binary: &OcspBinary) -> Vec<&OcspRef> {
        self.all_references()
            .filter(|r| binary.digest_value(r.digest.algorithm) == r.digest.value)
            .collect()
    }

    /// Returns the first reference whose digest equals `digest`.
    pub fn ocsp_ref_by_digest(&self, digest: &Digest) -> Option<&OcspRef> {
        self.all_references().find(|r| r.digest == *digest)
    }

    fn collect_values_from_table(
        &mut self,
        table: &AttributeTable,
        oid: &bcder::ConstOid,
        origin: RevocationOrigin,
    ) {
        for value in table.iter_values(oid) {
            if let AttributeValue::RevocationValues(data) = value {
                self.collect_values(data, origin);
            }
        }
    }

    fn collect_values(&mut self, data: &RevocationValuesData, origin: RevocationOrigin) {
        for der in &data.ocsps {
            let id = self.add_ocsp_binary(der.clone(), origin);
            let token = OcspToken::parse(&id, der);
            self.store_ocsp_token(&id, token);
        }
    }

    fn collect_refs_from_table(
        &mut self,
        table: &AttributeTable,
        oid: &bcder::ConstOid,
        location: RevocationRefLocation,
        tracker: &mut StatusTracker,
    ) {
        for value in table.iter_values(oid) {
            if let AttributeValue::RevocationRefs(data) = value {
                for d in &data.ocsp_refs {
                    match DigestAlgorithm::from_oid(&d.algorithm_oid) {
                        Ok(algorithm) => self.add_reference(OcspRef {
                            digest: Digest::new(algorithm, d.value.clone()),
                            location,
                        }),
                        Err(err) => {
                            log::warn!("excluding OCSP reference: {err}");

                            log_item!(
                                "ocsp_source",
                                "OCSP reference uses an unsupported digest algorithm",
                                "collect_refs_from_table"
                            )
                            .validation_status(validation_codes::REF_UNSUPPORTED_ALGORITHM)
                            .informational(tracker);
                        }
                    }
                }
            }
        }
    }

    fn collect_timestamp_data(
        &mut self,
        cms: &CmsSignedData,
        parser: &dyn CmsParser,
        tracker: &mut StatusTracker,
    ) {
        let mut tokens: Vec<&AttributeValue> = Vec::new();

        if let Some(table) = &cms.signer.signed_attributes {
            tokens.extend(table.iter_values(&oids::CONTENT_TIMESTAMP));
        }

        if let Some(table) = &cms.signer.unsigned_attributes {
            for oid in [
                &oids::SIGNATURE_TIMESTAMP,
                &oids::CERT_CRL_TIMESTAMP,
                &oids::ESC_TIMESTAMP,
                &oids::ARCHIVE_TIMESTAMP_V2,
                &oids::ARCHIVE_TIMESTAMP_V3,
            ] {
                tokens.extend(table.iter_values(oid));
            }
        }

        for value in tokens {
            let AttributeValue::TimestampToken(der) = value else {
                continue;
            };

            match parser.parse_timestamp_token(der) {
                Ok(parsed) => {
                    let inner = Self::from_timestamp(&parsed.signed_data, tracker);
                    self.add_values_from_inner_source(&inner);
                }
                Err(err) => {
                    log::warn!("skipping malformed timestamp token: {err}");

                    log_item!(
                        "ocsp_source",
                        "skipping malformed timestamp token",
                        "collect_timestamp_data"
                    )
                    .validation_status(validation_codes::TIMESTAMP_MALFORMED)
                    .failure_no_throw(tracker, err);
                }
            }
        }
    }
}
