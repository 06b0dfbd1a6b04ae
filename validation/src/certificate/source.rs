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

use std::sync::{Arc, OnceLock};

use ades_status_tracker::{log_item, validation_codes, StatusTracker};

use super::{CertificatePool, CertificateRef, CertificateRefOrigin, CertificateToken};
use crate::{
    cms::{oids, AttributeValue, CmsSignedData},
    digest::Digest,
};

/// The certificate evidence one signature carries, broken out by where
/// each item was found.
///
/// Implemented by [`EmbeddedCertificateSource`]; the trait exists so that
/// reference-matching utilities work over any source without caring which
/// signature format populated it.
pub trait SignatureCertificateSource {
    /// Certificates carried in the signed structure itself (the "key info"
    /// location).
    fn key_info_certificates(&self) -> &[Arc<CertificateToken>];

    /// Certificates from the unsigned certificate-values attribute.
    fn certificate_values(&self) -> &[Arc<CertificateToken>];

    /// Certificates from a time-stamp-validation-data element (XAdES).
    fn time_stamp_validation_data_certificates(&self) -> &[Arc<CertificateToken>] {
        &[]
    }

    /// Certificates from a PDF DSS dictionary (PAdES).
    fn dss_dictionary_certificates(&self) -> &[Arc<CertificateToken>] {
        &[]
    }

    /// Certificates from a PDF VRI dictionary (PAdES).
    fn vri_dictionary_certificates(&self) -> &[Arc<CertificateToken>] {
        &[]
    }

    /// References from the signed signing-certificate attribute.
    fn signing_certificate_refs(&self) -> &[CertificateRef];

    /// References from the unsigned complete-certificate-references
    /// attribute.
    fn complete_certificate_refs(&self) -> &[CertificateRef];

    /// References from the unsigned attribute-certificate-references
    /// attribute.
    fn attribute_certificate_refs(&self) -> &[CertificateRef];

    /// Cache cell for the token-to-references map.
    fn refs_map_cell(&self) -> &OnceLock<CertificateRefsMap>;

    /// Returns every certificate known to this source, deduplicated,
    /// preserving discovery order across locations.
    fn certificates(&self) -> Vec<Arc<CertificateToken>> {
        let mut all: Vec<Arc<CertificateToken>> = Vec::new();

        for token in self
            .key_info_certificates()
            .iter()
            .chain(self.certificate_values())
            .chain(self.time_stamp_validation_data_certificates())
            .chain(self.dss_dictionary_certificates())
            .chain(self.vri_dictionary_certificates())
        {
            if !all.contains(token) {
                all.push(token.clone());
            }
        }

        all
    }

    /// Returns every certificate reference known to this source.
    fn all_certificate_refs(&self) -> Vec<&CertificateRef> {
        self.signing_certificate_refs()
            .iter()
            .chain(self.complete_certificate_refs())
            .chain(self.attribute_certificate_refs())
            .collect()
    }
}

/// Map from certificate token to the references that designate it.
///
/// When a reference's claims are ambiguous (issuer + serial only, matching
/// more than one token), every matching token receives the reference.
#[derive(Debug, Default)]
pub struct CertificateRefsMap {
    entries: Vec<(Arc<CertificateToken>, Vec<CertificateRef>)>,
}

impl CertificateRefsMap {
    /// Returns the references designating `token`.
    pub fn get(&self, token: &CertificateToken) -> &[CertificateRef] {
        self.entries
            .iter()
            .find(|(t, _)| t.as_ref() == token)
            .map(|(_, refs)| refs.as_slice())
            .unwrap_or(&[])
    }
}

/// Builds (on first call) and returns the token-to-references map for
/// `source`.
pub fn certificate_refs_map<S: SignatureCertificateSource + ?Sized>(
    source: &S,
) -> &CertificateRefsMap {
    source.refs_map_cell().get_or_init(|| {
        let mut map = CertificateRefsMap::default();

        for token in source.certificates() {
            let refs: Vec<CertificateRef> = source
                .all_certificate_refs()
                .into_iter()
                .filter(|r| r.matches(&token))
                .cloned()
                .collect();

            map.entries.push((token, refs));
        }

        map
    })
}

/// Returns the references designating `token` within `source`.
pub fn references_for_certificate_token<'a, S: SignatureCertificateSource + ?Sized>(
    source: &'a S,
    token: &CertificateToken,
) -> &'a [CertificateRef] {
    certificate_refs_map(source).get(token)
}

/// Resolves `refs` against the certificates embedded in `source`,
/// returning every token some reference designates.
pub fn find_tokens_from_refs<S: SignatureCertificateSource + ?Sized>(
    source: &S,
    refs: &[CertificateRef],
) -> Vec<Arc<CertificateToken>> {
    let mut found: Vec<Arc<CertificateToken>> = Vec::new();

    for token in source.certificates() {
        if refs.iter().any(|r| r.matches(&token)) && !found.contains(&token) {
            found.push(token);
        }
    }

    found
}

/// Returns the first reference in `source` whose digest equals `digest`.
pub fn certificate_ref_by_digest<'a, S: SignatureCertificateSource + ?Sized>(
    source: &'a S,
    digest: &Digest,
) -> Option<&'a CertificateRef> {
    source
        .signing_certificate_refs()
        .iter()
        .chain(source.complete_certificate_refs())
        .chain(source.attribute_certificate_refs())
        .find(|r| r.cert_digest.as_ref() == Some(digest))
}

/// Certificate source populated from a parsed signed structure.
///
/// One instance per signature (or per timestamp token); construction is a
/// single pass over the relevant attributes, with malformed certificates
/// and unsupported reference algorithms logged and skipped.
#[derive(Debug, Default)]
pub struct EmbeddedCertificateSource {
    key_info: Vec<Arc<CertificateToken>>,
    certificate_values: Vec<Arc<CertificateToken>>,
    time_stamp_validation_data: Vec<Arc<CertificateToken>>,
    dss_dictionary: Vec<Arc<CertificateToken>>,
    vri_dictionary: Vec<Arc<CertificateToken>>,
    signing_refs: Vec<CertificateRef>,
    complete_refs: Vec<CertificateRef>,
    attribute_refs: Vec<CertificateRef>,
    refs_map: OnceLock<CertificateRefsMap>,
}

impl EmbeddedCertificateSource {
    /// Populates a source from a CMS signed-data structure: key-info
    /// certificates, certificate-values, and the three reference-bearing
    /// attributes.
    pub fn from_cms(
        cms: &CmsSignedData,
        pool: &CertificatePool,
        tracker: &mut StatusTracker,
    ) -> Self {
        let mut source = Self::default();

        source.collect_der_certificates(
            cms.certificates.iter().map(Vec::as_slice),
            CertificateLocation::KeyInfo,
            pool,
            tracker,
        );

        if let Some(table) = &cms.signer.unsigned_attributes {
            for value in table.iter_values(&oids::CERT_VALUES) {
                if let AttributeValue::Certificates(ders) = value {
                    source.collect_der_certificates(
                        ders.iter().map(Vec::as_slice),
                        CertificateLocation::CertificateValues,
                        pool,
                        tracker,
                    );
                }
            }

            source.collect_refs_from_table(
                table,
                &oids::CERTIFICATE_REFS,
                CertificateRefOrigin::CompleteCertificateRefs,
                tracker,
            );

            source.collect_refs_from_table(
                table,
                &oids::ATTRIBUTE_CERTIFICATE_REFS,
                CertificateRefOrigin::AttributeCertificateRefs,
                tracker,
            );
        }

        if let Some(table) = &cms.signer.signed_attributes {
            source.collect_refs_from_table(
                table,
                &oids::SIGNING_CERTIFICATE,
                CertificateRefOrigin::SigningCertificate,
                tracker,
            );

            source.collect_refs_from_table(
                table,
                &oids::SIGNING_CERTIFICATE_V2,
                CertificateRefOrigin::SigningCertificate,
                tracker,
            );
        }

        source
    }

    /// Adds a certificate found in a PDF DSS dictionary.
    pub fn add_dss_certificate(&mut self, token: Arc<CertificateToken>) {
        if !self.dss_dictionary.contains(&token) {
            self.dss_dictionary.push(token);
        }
    }

    /// Adds a certificate found in a PDF VRI dictionary.
    pub fn add_vri_certificate(&mut self, token: Arc<CertificateToken>) {
        if !self.vri_dictionary.contains(&token) {
            self.vri_dictionary.push(token);
        }
    }

    /// Adds a certificate from an XAdES time-stamp-validation-data element.
    pub fn add_time_stamp_validation_data_certificate(&mut self, token: Arc<CertificateToken>) {
        if !self.time_stamp_validation_data.contains(&token) {
            self.time_stamp_validation_data.push(token);
        }
    }

    /// Adds a certificate to the key-info list.
    pub fn add_key_info_certificate(&mut self, token: Arc<CertificateToken>) {
        if !self.key_info.contains(&token) {
            self.key_info.push(token);
        }
    }

    /// Adds a certificate to the certificate-values list.
    pub fn add_certificate_value(&mut self, token: Arc<CertificateToken>) {
        if !self.certificate_values.contains(&token) {
            self.certificate_values.push(token);
        }
    }

    /// Adds a reference to the list matching its origin.
    pub fn add_certificate_ref(&mut self, r: CertificateRef) {
        let list = match r.origin {
            CertificateRefOrigin::SigningCertificate => &mut self.signing_refs,
            CertificateRefOrigin::CompleteCertificateRefs => &mut self.complete_refs,
            CertificateRefOrigin::AttributeCertificateRefs => &mut self.attribute_refs,
        };

        if !list.contains(&r) {
            list.push(r);
        }
    }

    fn collect_der_certificates<'a>(
        &mut self,
        ders: impl Iterator<Item = &'a [u8]>,
        location: CertificateLocation,
        pool: &CertificatePool,
        tracker: &mut StatusTracker,
    ) {
        for der in ders {
            match pool.get_instance(der) {
                Ok(token) => match location {
                    CertificateLocation::KeyInfo => self.add_key_info_certificate(token),
                    CertificateLocation::CertificateValues => self.add_certificate_value(token),
                },
                Err(err) => {
                    log::warn!("skipping unparsable certificate: {err}");

                    log_item!(
                        "certificate_source",
                        "skipping unparsable certificate",
                        "collect_der_certificates"
                    )
                    .failure_no_throw(tracker, err);
                }
            }
        }
    }

    fn collect_refs_from_table(
        &mut self,
        table: &crate::cms::AttributeTable,
        oid: &bcder::ConstOid,
        origin: CertificateRefOrigin,
        tracker: &mut StatusTracker,
    ) {
        for value in table.iter_values(oid) {
            if let AttributeValue::CertificateRefs(datas) = value {
                for data in datas {
                    match CertificateRef::from_data(data, origin) {
                        Ok(r) => self.add_certificate_ref(r),
                        Err(err) => {
                            log::warn!("excluding certificate reference: {err}");

                            log_item!(
                                "certificate_source",
                                "certificate reference uses an unsupported digest algorithm",
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
}

#[derive(Clone, Copy)]
enum CertificateLocation {
    KeyInfo,
    CertificateValues,
}

impl SignatureCertificateSource for EmbeddedCertificateSource {
    fn key_info_certificates(&self) -> &[Arc<CertificateToken>] {
        &self.key_info
    }

    fn certificate_values(&self) -> &[Arc<CertificateToken>] {
        &self.certificate_values
    }

    fn time_stamp_validation_data_certificates(&self) -> &[Arc<CertificateToken>] {
        &self.time_stamp_validation_data
    }

    fn dss_dictionary_certificates(&self) -> &[Arc<CertificateToken>] {
        &self.dss_dictionary
    }

    fn vri_dictionary_certificates(&self) -> &[Arc<CertificateToken>] {
        &self.vri_dictionary
    }

    fn signing_certificate_refs(&self) -> &[CertificateRef] {
        &self.signing_refs
    }

    fn complete_certificate_refs(&self) -> &[CertificateRef] {
        &self.complete_refs
    }

    fn attribute_certificate_refs(&self) -> &[CertificateRef] {
        &self.attribute_refs
    }

    fn refs_map_cell(&self) -> &OnceLock<CertificateRefsMap> {
        &self.refs_map
    }
}
