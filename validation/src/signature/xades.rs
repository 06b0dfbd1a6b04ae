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
use chrono::{DateTime, Utc};

use super::{
    AdvancedSignature, DigestMatcherKind, ReferenceValidation, SignatureCryptographicVerification,
    SignatureError, SignatureForm, SignatureLevel,
};
use crate::{
    certificate::{
        CandidatesForSigningCertificate, CertificateRef, CertificateRefOrigin, CertificateToken,
        CertificateValidity, EmbeddedCertificateSource, SignatureCertificateSource,
    },
    cms::{CertificateRefData, CmsParser, DigestData, RevocationRefsData, RevocationValuesData},
    context::ValidationContext,
    digest::{Digest, DigestAlgorithm},
    raw_signature::RawSignatureValidator,
    revocation::{
        crl::{CrlRef, CrlToken, SignatureCrlSource},
        ocsp::{OcspRef, OcspToken, SignatureOcspSource},
        RevocationOrigin, RevocationRefLocation,
    },
    time_stamp::{
        references_for_archive_timestamp, SignatureTimestampSource, TimestampedObjectType,
        TimestampedReference, TimestampToken, TimestampType,
    },
};

/// One XML signature reference: the URI, the claimed digest, and the
/// resolved target bytes when the caller could dereference it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XmlReferenceData {
    /// The reference URI.
    pub uri: String,

    /// The claimed digest, algorithm still in OID form.
    pub digest: DigestData,

    /// The dereferenced and canonicalized target bytes. `None` when the
    /// target could not be resolved (detached data not supplied).
    pub resolved_content: Option<Vec<u8>>,
}

/// The decoded view of one XML signature, as delivered by the XML parsing
/// collaborator. DOM handling is out of scope; this struct is the contract
/// between it and the data model.
#[derive(Clone, Debug, Default)]
pub struct XadesSignatureData {
    /// DER-encoded certificates from the key-info element.
    pub key_info_certificates: Vec<Vec<u8>>,

    /// DER-encoded certificates from the certificate-values element.
    pub certificate_values: Vec<Vec<u8>>,

    /// DER-encoded certificates from time-stamp-validation-data elements.
    pub time_stamp_validation_data_certificates: Vec<Vec<u8>>,

    /// References from the signed signing-certificate element.
    pub signing_certificate_refs: Vec<CertificateRefData>,

    /// References from the complete-certificate-references element.
    pub complete_certificate_refs: Vec<CertificateRefData>,

    /// References from the attribute-certificate-references element.
    pub attribute_certificate_refs: Vec<CertificateRefData>,

    /// Revocation objects from the revocation-values element.
    pub revocation_values: RevocationValuesData,

    /// Revocation objects from the attribute-revocation-values element.
    pub attribute_revocation_values: RevocationValuesData,

    /// Revocation objects from time-stamp-validation-data elements.
    pub time_stamp_validation_data: RevocationValuesData,

    /// References from the complete-revocation-references element.
    pub complete_revocation_refs: RevocationRefsData,

    /// References from the attribute-revocation-references element.
    pub attribute_revocation_refs: RevocationRefsData,

    /// Encoded signature-timestamp tokens.
    pub signature_timestamps: Vec<Vec<u8>>,

    /// Encoded sig-and-refs-timestamp tokens.
    pub sig_and_refs_timestamps: Vec<Vec<u8>>,

    /// Encoded refs-only-timestamp tokens.
    pub refs_only_timestamps: Vec<Vec<u8>>,

    /// Encoded archive-timestamp tokens.
    pub archive_timestamps: Vec<Vec<u8>>,

    /// The claimed signing time from the signed properties.
    pub signing_time: Option<DateTime<Utc>>,

    /// Canonicalized signed-info bytes, the bytes actually covered by the
    /// signature value.
    pub signed_info: Vec<u8>,

    /// The signature value.
    pub signature_value: Vec<u8>,

    /// The signed references, resolved as far as the caller could.
    pub references: Vec<XmlReferenceData>,
}

/// An XML-based advanced electronic signature.
pub struct XadesSignature {
    data: XadesSignatureData,
    parser: Arc<dyn CmsParser>,
    context: Arc<ValidationContext>,
    id: String,

    provided_signing_certificate: Option<Arc<CertificateToken>>,

    cert_source: OnceLock<EmbeddedCertificateSource>,
    crl_source: OnceLock<SignatureCrlSource>,
    ocsp_source: OnceLock<SignatureOcspSource>,
    timestamp_source: OnceLock<SignatureTimestampSource>,
    candidates: OnceLock<CandidatesForSigningCertificate>,
    verification: OnceLock<SignatureCryptographicVerification>,
    reference_validations: OnceLock<Vec<ReferenceValidation>>,
}

impl std::fmt::Debug for XadesSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XadesSignature").field("id", &self.id).finish()
    }
}

impl XadesSignature {
    /// Wraps the decoded view of one XML signature.
    pub fn new(
        data: XadesSignatureData,
        parser: Arc<dyn CmsParser>,
        context: Arc<ValidationContext>,
    ) -> Self {
        let id = hex::encode(DigestAlgorithm::Sha256.digest(&data.signature_value));

        Self {
            data,
            parser,
            context,
            id,
            provided_signing_certificate: None,
            cert_source: OnceLock::new(),
            crl_source: OnceLock::new(),
            ocsp_source: OnceLock::new(),
            timestamp_source: OnceLock::new(),
            candidates: OnceLock::new(),
            verification: OnceLock::new(),
            reference_validations: OnceLock::new(),
        }
    }

    /// Overrides signing-certificate discovery with a known certificate.
    pub fn with_provided_signing_certificate(mut self, token: Arc<CertificateToken>) -> Self {
        self.provided_signing_certificate = Some(token);
        self
    }

    fn pooled_token(
        &self,
        der: &[u8],
        tracker: &mut StatusTracker,
    ) -> Option<Arc<CertificateToken>> {
        match self.context.pool.get_instance(der) {
            Ok(token) => Some(token),
            Err(err) => {
                log::warn!("skipping unparsable certificate: {err}");

                log_item!(
                    "certificate_source",
                    "skipping unparsable certificate",
                    "pooled_token"
                )
                .failure_no_throw(tracker, err);

                None
            }
        }
    }

    fn build_certificate_source(&self, tracker: &mut StatusTracker) -> EmbeddedCertificateSource {
        let mut source = EmbeddedCertificateSource::default();

        for der in &self.data.key_info_certificates {
            if let Some(token) = self.pooled_token(der, tracker) {
                source.add_key_info_certificate(token);
            }
        }

        for der in &self.data.certificate_values {
            if let Some(token) = self.pooled_token(der, tracker) {
                source.add_certificate_value(token);
            }
        }

        for der in &self.data.time_stamp_validation_data_certificates {
            if let Some(token) = self.pooled_token(der, tracker) {
                source.add_time_stamp_validation_data_certificate(token);
            }
        }

        for (datas, origin) in [
            (
                &self.data.signing_certificate_refs,
                CertificateRefOrigin::SigningCertificate,
            ),
            (
                &self.data.complete_certificate_refs,
                CertificateRefOrigin::CompleteCertificateRefs,
            ),
            (
                &self.data.attribute_certificate_refs,
                CertificateRefOrigin::AttributeCertificateRefs,
            ),
        ] {
            for data in datas {
                match CertificateRef::from_data(data, origin) {
                    Ok(r) => source.add_certificate_ref(r),
                    Err(err) => {
                        log::warn!("excluding certificate reference: {err}");

                        log_item!(
                            "certificate_source",
                            "certificate reference uses an unsupported digest algorithm",
                            "build_certificate_source"
                        )
                        .validation_status(validation_codes::REF_UNSUPPORTED_ALGORITHM)
                        .informational(tracker);
                    }
                }
            }
        }

        source
    }

    fn build_crl_source(&self, tracker: &mut StatusTracker) -> SignatureCrlSource {
        let mut source = SignatureCrlSource::default();

        for (values, origin) in [
            (&self.data.revocation_values, RevocationOrigin::RevocationValues),
            (
                &self.data.attribute_revocation_values,
                RevocationOrigin::AttributeRevocationValues,
            ),
            (
                &self.data.time_stamp_validation_data,
                RevocationOrigin::TimestampRevocationValues,
            ),
        ] {
            for der in &values.crls {
                let id = source.add_crl_binary(der.clone(), origin);
                let token = CrlToken::parse(&id, der);
                source.store_crl_token(&id, token);
            }
        }

        for (refs, location) in [
            (
                &self.data.complete_revocation_refs,
                RevocationRefLocation::CompleteRevocationRefs,
            ),
            (
                &self.data.attribute_revocation_refs,
                RevocationRefLocation::AttributeRevocationRefs,
            ),
        ] {
            for d in &refs.crl_refs {
                match DigestAlgorithm::from_oid(&d.algorithm_oid) {
                    Ok(algorithm) => source.add_reference(CrlRef {
                        digest: Digest::new(algorithm, d.value.clone()),
                        location,
                    }),
                    Err(err) => {
                        log::warn!("excluding CRL reference: {err}");

                        log_item!(
                            "crl_source",
                            "CRL reference uses an unsupported digest algorithm",
                            "build_crl_source"
                        )
                        .validation_status(validation_codes::REF_UNSUPPORTED_ALGORITHM)
                        .informational(tracker);
                    }
                }
            }
        }

        for encoded in self.all_encoded_timestamps() {
            if let Ok(parsed) = self.parser.parse_timestamp_token(encoded) {
                let inner = SignatureCrlSource::from_timestamp(&parsed.signed_data, tracker);
                source.add_values_from_inner_source(&inner);
            }
        }

        source
    }

    fn build_ocsp_source(&self, tracker: &mut StatusTracker) -> SignatureOcspSource {
        let mut source = SignatureOcspSource::default();

        for (values, origin) in [
            (&self.data.revocation_values, RevocationOrigin::RevocationValues),
            (
                &self.data.attribute_revocation_values,
                RevocationOrigin::AttributeRevocationValues,
            ),
            (
                &self.data.time_stamp_validation_data,
                RevocationOrigin::TimestampRevocationValues,
            ),
        ] {
            for der in &values.ocsps {
                let id = source.add_ocsp_binary(der.clone(), origin);
                let token = OcspToken::parse(&id, der);
                source.store_ocsp_token(&id, token);
            }
        }

        for (refs, location) in [
            (
                &self.data.complete_revocation_refs,
                RevocationRefLocation::CompleteRevocationRefs,
            ),
            (
                &self.data.attribute_revocation_refs,
                RevocationRefLocation::AttributeRevocationRefs,
            ),
        ] {
            for d in &refs.ocsp_refs {
                match DigestAlgorithm::from_oid(&d.algorithm_oid) {
                    Ok(algorithm) => source.add_reference(OcspRef {
                        digest: Digest::new(algorithm, d.value.clone()),
                        location,
                    }),
                    Err(err) => {
                        log::warn!("excluding OCSP reference: {err}");

                        log_item!(
                            "ocsp_source",
                            "OCSP reference uses an unsupported digest algorithm",
                            "build_ocsp_source"
                        )
                        .validation_status(validation_codes::REF_UNSUPPORTED_ALGORITHM)
                        .informational(tracker);
                    }
                }
            }
        }

        for encoded in self.all_encoded_timestamps() {
            if let Ok(parsed) = self.parser.parse_timestamp_token(encoded) {
                let inner = SignatureOcspSource::from_timestamp(&parsed.signed_data, tracker);
                source.add_values_from_inner_source(&inner);
            }
        }

        source
    }

    fn all_encoded_timestamps(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.data
            .signature_timestamps
            .iter()
            .chain(&self.data.sig_and_refs_timestamps)
            .chain(&self.data.refs_only_timestamps)
            .chain(&self.data.archive_timestamps)
    }

    fn decode_timestamp(
        &self,
        encoded: &[u8],
        ts_type: TimestampType,
        tracker: &mut StatusTracker,
    ) -> Option<TimestampToken> {
        match self.parser.parse_timestamp_token(encoded) {
            Ok(parsed) => {
                let token = TimestampToken::new(
                    encoded.to_vec(),
                    ts_type,
                    &parsed,
                    &self.context.pool,
                    tracker,
                );

                log_item!("time_stamp", "timestamp token collected", "decode_timestamp")
                    .validation_status(validation_codes::TIMESTAMP_COLLECTED)
                    .success(tracker);

                Some(token)
            }
            Err(err) => {
                log::warn!("skipping malformed timestamp token: {err}");

                log_item!(
                    "time_stamp",
                    "skipping malformed timestamp token",
                    "decode_timestamp"
                )
                .validation_status(validation_codes::TIMESTAMP_MALFORMED)
                .failure_no_throw(tracker, err);

                None
            }
        }
    }

    fn build_timestamp_source(&self, tracker: &mut StatusTracker) -> SignatureTimestampSource {
        let mut source = SignatureTimestampSource::new();

        let signature_reference =
            TimestampedReference::new(TimestampedObjectType::SignedData, self.id.clone());

        for encoded in &self.data.signature_timestamps {
            if let Some(mut token) =
                self.decode_timestamp(encoded, TimestampType::SignatureTimestamp, tracker)
            {
                token.set_timestamped_references(vec![signature_reference.clone()]);
                source.push_signature_timestamp(token);
            }
        }

        for encoded in &self.data.sig_and_refs_timestamps {
            if let Some(token) =
                self.decode_timestamp(encoded, TimestampType::SigAndRefsTimestamp, tracker)
            {
                source.push_sig_and_refs_timestamp(token);
            }
        }

        for encoded in &self.data.refs_only_timestamps {
            if let Some(token) =
                self.decode_timestamp(encoded, TimestampType::RefsOnlyTimestamp, tracker)
            {
                source.push_refs_only_timestamp(token);
            }
        }

        let direct = self.direct_timestamp_references(tracker);

        for encoded in &self.data.archive_timestamps {
            if let Some(mut token) =
                self.decode_timestamp(encoded, TimestampType::ArchiveTimestampV2, tracker)
            {
                let previous = source.all();
                token.set_timestamped_references(references_for_archive_timestamp(
                    std::slice::from_ref(&signature_reference),
                    &previous,
                    &direct,
                ));
                source.push_archive_timestamp(token);
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

    fn build_candidates(&self, tracker: &mut StatusTracker) -> CandidatesForSigningCertificate {
        let mut candidates = CandidatesForSigningCertificate::new();

        let first_ref = self
            .certificate_source(tracker)
            .signing_certificate_refs()
            .first()
            .cloned();

        let tokens: Vec<Arc<CertificateToken>> = match &self.provided_signing_certificate {
            Some(provided) => vec![provided.clone()],
            None => self
                .certificate_source(tracker)
                .key_info_certificates()
                .to_vec(),
        };

        for token in tokens {
            let mut validity = CertificateValidity::new(token.clone());

            if let Some(r) = &first_ref {
                validity.attribute_present = true;

                if let Some(digest) = &r.cert_digest {
                    validity.digest_present = true;
                    validity.digest_equal = token.matches_digest(digest);
                }

                if let Some(info) = &r.issuer_info {
                    validity.issuer_serial_present = true;
                    validity.serial_equal = token.serial() == info.serial.as_slice();
                    validity.issuer_equal =
                        token.issuer_name_der() == info.issuer_name.as_slice();
                }
            }

            candidates.add(validity);
        }

        // With a signing-certificate element the first validated candidate
        // wins; without one the first key-info certificate is assumed to be
        // the signer.
        let best = if first_ref.is_some() {
            candidates.candidates().iter().position(|v| v.is_valid())
        } else if candidates.is_empty() {
            None
        } else {
            Some(0)
        };

        match best {
            Some(index) => {
                candidates.set_best(index);

                log_item!(
                    "signing_certificate",
                    "signing certificate resolved",
                    "build_candidates"
                )
                .validation_status(validation_codes::SIGNING_CERTIFICATE_FOUND)
                .success(tracker);
            }
            None => {
                log::warn!("signature {}: no signing certificate candidate", self.id);

                log_item!(
                    "signing_certificate",
                    "no certificate validates against the signing-certificate element",
                    "build_candidates"
                )
                .validation_status(validation_codes::SIGNING_CERTIFICATE_NOT_FOUND)
                .informational(tracker);
            }
        }

        candidates
    }

    fn build_reference_validations(
        &self,
        tracker: &mut StatusTracker,
    ) -> Vec<ReferenceValidation> {
        let mut validations = Vec::new();

        for reference in &self.data.references {
            let mut validation = ReferenceValidation {
                kind: DigestMatcherKind::XmlReference,
                found: reference.resolved_content.is_some(),
                intact: false,
                digest: None,
            };

            if let Some(content) = &reference.resolved_content {
                match DigestAlgorithm::from_oid(&reference.digest.algorithm_oid) {
                    Ok(algorithm) => {
                        validation.intact =
                            algorithm.digest(content) == reference.digest.value;
                        validation.digest =
                            Some(Digest::new(algorithm, reference.digest.value.clone()));
                    }
                    Err(err) => {
                        log::warn!("reference {}: {err}", reference.uri);

                        log_item!(
                            "xml_reference",
                            "reference uses an unsupported digest algorithm",
                            "build_reference_validations"
                        )
                        .validation_status(validation_codes::REF_UNSUPPORTED_ALGORITHM)
                        .informational(tracker);
                    }
                }
            }

            validations.push(validation);
        }

        validations
    }
}

impl AdvancedSignature for XadesSignature {
    fn id(&self) -> &str {
        &self.id
    }

    fn signature_form(&self) -> SignatureForm {
        SignatureForm::Xades
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
        self.candidates.get_or_init(|| self.build_candidates(tracker))
    }

    fn signing_time(&self, _tracker: &mut StatusTracker) -> Option<DateTime<Utc>> {
        self.data.signing_time
    }

    fn check_signature_integrity(
        &self,
        validator: &dyn RawSignatureValidator,
        tracker: &mut StatusTracker,
    ) -> &SignatureCryptographicVerification {
        self.verification.get_or_init(|| {
            let mut verification = SignatureCryptographicVerification::default();

            let Some(signing_certificate) =
                self.candidates_for_signing_certificate(tracker).best_token()
            else {
                verification.error_message =
                    Some("no signing certificate available".to_string());
                return verification;
            };

            let references = self.build_reference_validations(tracker);
            verification.reference_data_found =
                !references.is_empty() && references.iter().all(|r| r.found);
            verification.reference_data_intact =
                verification.reference_data_found && references.iter().all(|r| r.intact);
            let _ = self.reference_validations.set(references);

            match validator.validate(
                &self.data.signature_value,
                &self.data.signed_info,
                signing_certificate.public_key_der(),
            ) {
                Ok(()) => {
                    verification.signature_intact = true;

                    log_item!("signature", "signature intact", "check_signature_integrity")
                        .validation_status(validation_codes::SIGNATURE_INTACT)
                        .success(tracker);
                }
                Err(err) => {
                    verification.error_message = Some(err.to_string());

                    log_item!(
                        "signature",
                        "signature verification failed",
                        "check_signature_integrity"
                    )
                    .validation_status(validation_codes::SIGNATURE_NOT_INTACT)
                    .failure_no_throw(tracker, err);
                }
            }

            verification
        })
    }

    fn reference_validations(&self) -> &[ReferenceValidation] {
        self.reference_validations
            .get()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn signature_levels(&self) -> &'static [SignatureLevel] {
        &[
            SignatureLevel::BaselineB,
            SignatureLevel::BaselineT,
            SignatureLevel::C,
            SignatureLevel::X,
            SignatureLevel::Xl,
            SignatureLevel::A,
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

        let data = &self.data;
        let has_complete_refs = !data.complete_certificate_refs.is_empty()
            && (!data.complete_revocation_refs.crl_refs.is_empty()
                || !data.complete_revocation_refs.ocsp_refs.is_empty());

        let satisfied = match level {
            SignatureLevel::NotEtsi => true,

            SignatureLevel::BaselineB => !data.signing_certificate_refs.is_empty(),

            SignatureLevel::BaselineT => {
                self.is_data_for_level_present(SignatureLevel::BaselineB, tracker)?
                    && !data.signature_timestamps.is_empty()
            }

            SignatureLevel::C => {
                self.is_data_for_level_present(SignatureLevel::BaselineT, tracker)?
                    && has_complete_refs
            }

            SignatureLevel::X => {
                self.is_data_for_level_present(SignatureLevel::C, tracker)?
                    && (!data.sig_and_refs_timestamps.is_empty()
                        || !data.refs_only_timestamps.is_empty())
            }

            SignatureLevel::Xl => {
                self.is_data_for_level_present(SignatureLevel::X, tracker)?
                    && !data.certificate_values.is_empty()
                    && (!data.revocation_values.crls.is_empty()
                        || !data.revocation_values.ocsps.is_empty())
            }

            SignatureLevel::A => {
                self.is_data_for_level_present(SignatureLevel::Xl, tracker)?
                    && !data.archive_timestamps.is_empty()
            }

            SignatureLevel::BaselineLt => {
                self.is_data_for_level_present(SignatureLevel::BaselineT, tracker)?
                    && (!data.archive_timestamps.is_empty() || has_complete_refs)
            }

            SignatureLevel::BaselineLta => {
                self.is_data_for_level_present(SignatureLevel::BaselineLt, tracker)?
                    && !data.archive_timestamps.is_empty()
            }
        };

        Ok(satisfied)
    }
}
