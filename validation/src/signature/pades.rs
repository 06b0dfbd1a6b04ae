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

use std::sync::OnceLock;

use ades_status_tracker::{log_item, validation_codes, StatusTracker};
use chrono::{DateTime, Utc};

use super::{
    AdvancedSignature, CadesSignature, ReferenceValidation, SignatureCryptographicVerification,
    SignatureError, SignatureForm, SignatureLevel,
};
use crate::{
    certificate::{
        CandidatesForSigningCertificate, EmbeddedCertificateSource, SignatureCertificateSource,
    },
    policy::{SignaturePolicy, SignaturePolicyProvider},
    raw_signature::RawSignatureValidator,
    revocation::{
        crl::{CrlToken, SignatureCrlSource},
        ocsp::{OcspToken, SignatureOcspSource},
        RevocationOrigin,
    },
    time_stamp::{
        SignatureTimestampSource, TimestampedObjectType, TimestampedReference, TimestampToken,
        TimestampType,
    },
};

/// One VRI (validation-related information) dictionary from a PDF
/// document security store, keyed by the signature it applies to.
#[derive(Clone, Debug, Default)]
pub struct PdfVriDict {
    /// The VRI key (hex-encoded SHA-1 of the signature it applies to).
    pub key: String,

    /// DER-encoded certificates.
    pub certs: Vec<Vec<u8>>,

    /// DER-encoded CRLs.
    pub crls: Vec<Vec<u8>>,

    /// DER-encoded OCSP responses.
    pub ocsps: Vec<Vec<u8>>,
}

/// A PDF document security store (DSS) dictionary: catalogued
/// certificates and revocation objects from an incremental update.
#[derive(Clone, Debug, Default)]
pub struct PdfDssDict {
    /// DER-encoded certificates.
    pub certs: Vec<Vec<u8>>,

    /// DER-encoded CRLs.
    pub crls: Vec<Vec<u8>>,

    /// DER-encoded OCSP responses.
    pub ocsps: Vec<Vec<u8>>,

    /// Per-signature VRI dictionaries.
    pub vris: Vec<PdfVriDict>,
}

impl PdfDssDict {
    /// Returns `true` when the store carries any revocation object,
    /// directly or through a VRI dictionary.
    pub fn has_revocation_data(&self) -> bool {
        !self.crls.is_empty()
            || !self.ocsps.is_empty()
            || self
                .vris
                .iter()
                .any(|v| !v.crls.is_empty() || !v.ocsps.is_empty())
    }
}

/// A PDF-embedded advanced electronic signature: a CMS signature plus the
/// validation data catalogued by the document (DSS/VRI dictionaries and
/// document timestamps).
pub struct PadesSignature {
    cades: CadesSignature,
    dss: Option<PdfDssDict>,
    document_timestamps: Vec<Vec<u8>>,
    dictionary_signing_date: Option<DateTime<Utc>>,

    cert_source: OnceLock<EmbeddedCertificateSource>,
    crl_source: OnceLock<SignatureCrlSource>,
    ocsp_source: OnceLock<SignatureOcspSource>,
    timestamp_source: OnceLock<SignatureTimestampSource>,
}

impl std::fmt::Debug for PadesSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PadesSignature")
            .field("id", &self.cades.id())
            .finish()
    }
}

impl PadesSignature {
    /// Wraps the embedded CMS signature of one PDF signature field.
    pub fn new(cades: CadesSignature) -> Self {
        Self {
            cades,
            dss: None,
            document_timestamps: Vec::new(),
            dictionary_signing_date: None,
            cert_source: OnceLock::new(),
            crl_source: OnceLock::new(),
            ocsp_source: OnceLock::new(),
            timestamp_source: OnceLock::new(),
        }
    }

    /// Supplies the parsed DSS dictionary from the document's incremental
    /// updates.
    pub fn with_dss_dict(mut self, dss: PdfDssDict) -> Self {
        self.dss = Some(dss);
        self
    }

    /// Adds an encoded document timestamp covering this revision.
    pub fn with_document_timestamp(mut self, encoded: Vec<u8>) -> Self {
        self.document_timestamps.push(encoded);
        self
    }

    /// Supplies the signing date claimed by the signature dictionary
    /// (the `/M` entry). It takes precedence over the CMS signing time.
    pub fn with_dictionary_signing_date(mut self, date: DateTime<Utc>) -> Self {
        self.dictionary_signing_date = Some(date);
        self
    }

    /// Returns the wrapped CMS signature.
    pub fn cades(&self) -> &CadesSignature {
        &self.cades
    }

    /// Returns the parsed DSS dictionary, if the document carries one.
    pub fn dss_dict(&self) -> Option<&PdfDssDict> {
        self.dss.as_ref()
    }

    fn build_certificate_source(&self, tracker: &mut StatusTracker) -> EmbeddedCertificateSource {
        let mut source = EmbeddedCertificateSource::from_cms(
            self.cades.cms(),
            &self.cades.context().pool,
            tracker,
        );

        let Some(dss) = &self.dss else {
            return source;
        };

        for der in &dss.certs {
            match self.cades.context().pool.get_instance(der) {
                Ok(token) => source.add_dss_certificate(token),
                Err(err) => {
                    log::warn!("skipping unparsable DSS certificate: {err}");

                    log_item!(
                        "certificate_source",
                        "skipping unparsable DSS certificate",
                        "build_certificate_source"
                    )
                    .failure_no_throw(tracker, err);
                }
            }
        }

        for vri in &dss.vris {
            for der in &vri.certs {
                match self.cades.context().pool.get_instance(der) {
                    Ok(token) => source.add_vri_certificate(token),
                    Err(err) => {
                        log::warn!("skipping unparsable VRI certificate: {err}");

                        log_item!(
                            "certificate_source",
                            "skipping unparsable VRI certificate",
                            "build_certificate_source"
                        )
                        .failure_no_throw(tracker, err);
                    }
                }
            }
        }

        source
    }

    fn build_crl_source(&self, tracker: &mut StatusTracker) -> SignatureCrlSource {
        let mut source = SignatureCrlSource::from_cms(
            self.cades.cms(),
            self.cades.parser().as_ref(),
            tracker,
        );

        if let Some(dss) = &self.dss {
            for der in &dss.crls {
                let id = source.add_crl_binary(der.clone(), RevocationOrigin::DssDictionary);
                let token = CrlToken::parse(&id, der);
                source.store_crl_token(&id, token);
            }

            for vri in &dss.vris {
                for der in &vri.crls {
                    let id = source.add_crl_binary(der.clone(), RevocationOrigin::VriDictionary);
                    let token = CrlToken::parse(&id, der);
                    source.store_crl_token(&id, token);
                }
            }
        }

        source
    }

    fn build_ocsp_source(&self, tracker: &mut StatusTracker) -> SignatureOcspSource {
        let mut source = SignatureOcspSource::from_cms(
            self.cades.cms(),
            self.cades.parser().as_ref(),
            tracker,
        );

        if let Some(dss) = &self.dss {
            for der in &dss.ocsps {
                let id = source.add_ocsp_binary(der.clone(), RevocationOrigin::DssDictionary);
                let token = OcspToken::parse(&id, der);
                source.store_ocsp_token(&id, token);
            }

            for vri in &dss.vris {
                for der in &vri.ocsps {
                    let id = source.add_ocsp_binary(der.clone(), RevocationOrigin::VriDictionary);
                    let token = OcspToken::parse(&id, der);
                    source.store_ocsp_token(&id, token);
                }
            }
        }

        source
    }

    fn build_timestamp_source(&self, tracker: &mut StatusTracker) -> SignatureTimestampSource {
        let direct = self.direct_timestamp_references(tracker);

        let mut source = SignatureTimestampSource::from_cms(
            self.cades.cms(),
            self.cades.id(),
            &direct,
            self.cades.parser().as_ref(),
            &self.cades.context().pool,
            tracker,
        );

        for encoded in &self.document_timestamps {
            match self.cades.parser().parse_timestamp_token(encoded) {
                Ok(parsed) => {
                    let mut token = TimestampToken::new(
                        encoded.clone(),
                        TimestampType::DocumentTimestamp,
                        &parsed,
                        &self.cades.context().pool,
                        tracker,
                    );

                    // A document timestamp covers the whole revision: the
                    // signature, every prior timestamp, and the catalogued
                    // validation data.
                    let previous = source.all();
                    token.set_timestamped_references(
                        crate::time_stamp::references_for_archive_timestamp(
                            &[TimestampedReference::new(
                                TimestampedObjectType::SignedData,
                                self.cades.id(),
                            )],
                            &previous,
                            &direct,
                        ),
                    );

                    log_item!(
                        "time_stamp",
                        "timestamp token collected",
                        "build_timestamp_source"
                    )
                    .validation_status(validation_codes::TIMESTAMP_COLLECTED)
                    .success(tracker);

                    source.push_document_timestamp(token);
                }
                Err(err) => {
                    log::warn!("skipping malformed document timestamp: {err}");

                    log_item!(
                        "time_stamp",
                        "skipping malformed document timestamp",
                        "build_timestamp_source"
                    )
                    .validation_status(validation_codes::TIMESTAMP_MALFORMED)
                    .failure_no_throw(tracker, err);
                }
            }
        }

        source
    }

    fn direct_timestamp_references(
        &self,
        tracker: &mut StatusTracker,
    ) -> Vec<TimestampedReference> {
        let mut references: Vec<TimestampedReference> = Vec::new();

        for token in self.certificate_source(tracker).certificates() {
            references.push(TimestampedReference::new(
                TimestampedObjectType::Certificate,
                token.id(),
            ));
        }

        for binary in self.crl_source(tracker).binaries() {
            references.push(TimestampedReference::new(
                TimestampedObjectType::Revocation,
                binary.id(),
            ));
        }

        for binary in self.ocsp_source(tracker).binaries() {
            references.push(TimestampedReference::new(
                TimestampedObjectType::Revocation,
                binary.id(),
            ));
        }

        references
    }
}

impl AdvancedSignature for PadesSignature {
    fn id(&self) -> &str {
        self.cades.id()
    }

    fn signature_form(&self) -> SignatureForm {
        SignatureForm::Pades
    }

    fn certificate_source(&self, tracker: &mut StatusTracker) -> &EmbeddedCertificateSource {
        self.cert_source
            .get_or_init(|| self.build_certificate_source(tracker))
    }

    fn crl_source(&self, tracker: &mut StatusTracker) -> &SignatureCrlSource {
        self.crl_source.get_or_init(|| self.build_crl_source(tracker))
    }

    fn ocsp_source(&self, tracker: &mut StatusTracker) -> &SignatureOcspSource {
        self.ocsp_source
            .get_or_init(|| self.build_ocsp_source(tracker))
    }

    fn timestamp_source(&self, tracker: &mut StatusTracker) -> &SignatureTimestampSource {
        self.timestamp_source
            .get_or_init(|| self.build_timestamp_source(tracker))
    }

    fn candidates_for_signing_certificate(
        &self,
        tracker: &mut StatusTracker,
    ) -> &CandidatesForSigningCertificate {
        self.cades.candidates_for_signing_certificate(tracker)
    }

    fn signing_time(&self, tracker: &mut StatusTracker) -> Option<DateTime<Utc>> {
        self.dictionary_signing_date
            .or_else(|| self.cades.signing_time(tracker))
    }

    fn check_signature_integrity(
        &self,
        validator: &dyn RawSignatureValidator,
        tracker: &mut StatusTracker,
    ) -> &SignatureCryptographicVerification {
        self.cades.check_signature_integrity(validator, tracker)
    }

    fn reference_validations(&self) -> &[ReferenceValidation] {
        self.cades.reference_validations()
    }

    fn signature_levels(&self) -> &'static [SignatureLevel] {
        &[
            SignatureLevel::BaselineB,
            SignatureLevel::BaselineT,
            SignatureLevel::BaselineLt,
            SignatureLevel::BaselineLta,
        ]
    }

    fn is_data_for_level_present(
        &self,
        level: SignatureLevel,
        tracker: &mut StatusTracker,
    ) -> Result<bool, SignatureError> {
        if !level.applicable_to(self.signature_form()) {
            return Err(SignatureError::UnknownLevel {
                level,
                form: self.signature_form(),
            });
        }

        let satisfied = match level {
            SignatureLevel::NotEtsi => true,

            SignatureLevel::BaselineB => {
                self.cades.is_data_for_level_present(SignatureLevel::BaselineB, tracker)?
            }

            SignatureLevel::BaselineT => {
                let ts = self.timestamp_source(tracker);

                self.is_data_for_level_present(SignatureLevel::BaselineB, tracker)?
                    && (!ts.signature_timestamps().is_empty()
                        || !ts.document_timestamps().is_empty())
            }

            SignatureLevel::BaselineLt => {
                self.is_data_for_level_present(SignatureLevel::BaselineT, tracker)?
                    && self
                        .dss
                        .as_ref()
                        .is_some_and(|dss| !dss.certs.is_empty() && dss.has_revocation_data())
            }

            SignatureLevel::BaselineLta => {
                self.is_data_for_level_present(SignatureLevel::BaselineLt, tracker)?
                    && !self.timestamp_source(tracker).document_timestamps().is_empty()
            }

            // Unreachable: applicable_to rejected these above.
            SignatureLevel::C | SignatureLevel::X | SignatureLevel::Xl | SignatureLevel::A => {
                false
            }
        };

        Ok(satisfied)
    }

    fn signature_policy(
        &self,
        provider: &dyn SignaturePolicyProvider,
        tracker: &mut StatusTracker,
    ) -> Option<&SignaturePolicy> {
        self.cades.signature_policy(provider, tracker)
    }

    fn content_type(&self) -> Option<String> {
        self.cades.content_type()
    }

    fn message_digest(&self) -> Option<Vec<u8>> {
        self.cades.message_digest()
    }
}
