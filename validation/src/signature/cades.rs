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
use bcder::{decode::Constructed, Mode, OctetString, Oid};
use chrono::{DateTime, Utc};
use x509_certificate::asn1time::Time;

use super::{
    AdvancedSignature, DigestMatcherKind, ReferenceValidation, SignatureCryptographicVerification,
    SignatureError, SignatureForm, SignatureLevel,
};
use crate::{
    certificate::{
        CandidatesForSigningCertificate, CertificateToken, CertificateValidity,
        EmbeddedCertificateSource, SignatureCertificateSource,
    },
    cms::{oids, AttributeValue, CmsParser, CmsSignedData, PolicyQualifierData},
    context::ValidationContext,
    digest::{Digest, DigestAlgorithm},
    policy::{SignaturePolicy, SignaturePolicyProvider},
    raw_signature::RawSignatureValidator,
    time_stamp::{
        SignatureTimestampSource, TimestampedObjectType, TimestampedReference, TimestampToken,
    },
};

// RFC 3852: dates from 1950 through 2049 must be encoded as UTCTime;
// dates outside that range must be encoded as GeneralizedTime.
const UTC_TIME_RANGE_START: i64 = -631_152_000; // 1950-01-01T00:00:00Z
const UTC_TIME_RANGE_END: i64 = 2_524_608_000; // 2050-01-01T00:00:00Z

/// A CMS-based advanced electronic signature.
///
/// Wraps one parsed signed-data structure and lazily reconstructs the
/// evidence it carries. Every source is populated on first access and
/// cached for the lifetime of the object.
pub struct CadesSignature {
    cms: CmsSignedData,
    parser: Arc<dyn CmsParser>,
    context: Arc<ValidationContext>,
    id: String,

    detached_content: Option<Vec<u8>>,
    provided_signing_certificate: Option<Arc<CertificateToken>>,

    cert_source: OnceLock<EmbeddedCertificateSource>,
    crl_source: OnceLock<crate::revocation::crl::SignatureCrlSource>,
    ocsp_source: OnceLock<crate::revocation::ocsp::SignatureOcspSource>,
    timestamp_source: OnceLock<SignatureTimestampSource>,
    candidates: OnceLock<CandidatesForSigningCertificate>,
    verification: OnceLock<SignatureCryptographicVerification>,
    reference_validations: OnceLock<Vec<ReferenceValidation>>,
    policy: OnceLock<Option<SignaturePolicy>>,
}

impl std::fmt::Debug for CadesSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CadesSignature").field("id", &self.id).finish()
    }
}

impl CadesSignature {
    /// Wraps a parsed signed-data structure.
    pub fn new(
        cms: CmsSignedData,
        parser: Arc<dyn CmsParser>,
        context: Arc<ValidationContext>,
    ) -> Self {
        let id = hex::encode(DigestAlgorithm::Sha256.digest(&cms.signer.signature));

        Self {
            cms,
            parser,
            context,
            id,
            detached_content: None,
            provided_signing_certificate: None,
            cert_source: OnceLock::new(),
            crl_source: OnceLock::new(),
            ocsp_source: OnceLock::new(),
            timestamp_source: OnceLock::new(),
            candidates: OnceLock::new(),
            verification: OnceLock::new(),
            reference_validations: OnceLock::new(),
            policy: OnceLock::new(),
        }
    }

    /// Supplies the payload bytes for a detached signature.
    pub fn with_detached_content(mut self, content: Vec<u8>) -> Self {
        self.detached_content = Some(content);
        self
    }

    /// Overrides signing-certificate discovery with a known certificate.
    /// The override takes precedence over every discovered candidate.
    pub fn with_provided_signing_certificate(mut self, token: Arc<CertificateToken>) -> Self {
        self.provided_signing_certificate = Some(token);
        self
    }

    /// Returns the underlying signed-data structure.
    pub fn cms(&self) -> &CmsSignedData {
        &self.cms
    }

    /// Returns the shared validation context.
    pub fn context(&self) -> &Arc<ValidationContext> {
        &self.context
    }

    pub(crate) fn parser(&self) -> &Arc<dyn CmsParser> {
        &self.parser
    }

    fn signed_content(&self) -> Option<&[u8]> {
        self.cms
            .content
            .as_deref()
            .or(self.detached_content.as_deref())
    }

    fn build_candidates(&self, tracker: &mut StatusTracker) -> CandidatesForSigningCertificate {
        let mut candidates = CandidatesForSigningCertificate::new();

        if let Some(provided) = &self.provided_signing_certificate {
            let mut validity = CertificateValidity::new(provided.clone());
            validity.signer_id_match = self.cms.signer.sid.matches(provided);
            let index = candidates.add(validity);
            candidates.set_best(index);
            self.verify_signing_certificate_refs(&mut candidates, tracker);
            return candidates;
        }

        let mut best = None;

        for token in self.certificate_source(tracker).key_info_certificates() {
            let mut validity = CertificateValidity::new(token.clone());
            validity.signer_id_match = self.cms.signer.sid.matches(token);

            let index = candidates.add(validity);
            if best.is_none() && candidates.candidates()[index].signer_id_match {
                best = Some(index);
            }
        }

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

                self.verify_signing_certificate_refs(&mut candidates, tracker);
            }
            None => {
                log::warn!("signature {}: no signing certificate candidate", self.id);

                log_item!(
                    "signing_certificate",
                    "no certificate matches the signer identifier",
                    "build_candidates"
                )
                .validation_status(validation_codes::SIGNING_CERTIFICATE_NOT_FOUND)
                .informational(tracker);
            }
        }

        candidates
    }

    /// Checks the elected candidate against the signed signing-certificate
    /// reference. Only the first reference is authoritative (RFC 5035);
    /// later entries are ignored.
    fn verify_signing_certificate_refs(
        &self,
        candidates: &mut CandidatesForSigningCertificate,
        tracker: &mut StatusTracker,
    ) {
        let Some(first_ref) = self
            .certificate_source(tracker)
            .signing_certificate_refs()
            .first()
            .cloned()
        else {
            return;
        };

        let Some(index) = candidates.best_index() else {
            return;
        };

        let Some(best) = candidates.candidate_mut(index) else {
            return;
        };

        best.attribute_present = true;

        if let Some(digest) = &first_ref.cert_digest {
            best.digest_present = true;
            best.digest_equal = best.token().matches_digest(digest);
        }

        if let Some(info) = &first_ref.issuer_info {
            best.issuer_serial_present = true;
            best.serial_equal = best.token().serial() == info.serial.as_slice();
            best.issuer_equal = best.token().issuer_name_der() == info.issuer_name.as_slice();
        }

        if best.digest_present && !best.digest_equal {
            log::warn!(
                "signature {}: signing certificate reference digest mismatch",
                self.id
            );

            log_item!(
                "signing_certificate",
                "signing certificate reference digest does not match the resolved certificate",
                "verify_signing_certificate_refs"
            )
            .validation_status(validation_codes::SIGNING_CERTIFICATE_REF_MISMATCH)
            .informational(tracker);
        }
    }

    fn build_reference_validations(
        &self,
        tracker: &mut StatusTracker,
    ) -> Vec<ReferenceValidation> {
        let claimed = self.message_digest();
        let content = self.signed_content();

        let mut validation = ReferenceValidation {
            kind: DigestMatcherKind::MessageDigest,
            found: claimed.is_some() && content.is_some(),
            intact: false,
            digest: None,
        };

        if let (Some(claimed), Some(content)) = (claimed, content) {
            match DigestAlgorithm::from_oid(&self.cms.signer.digest_algorithm_oid) {
                Ok(algorithm) => {
                    validation.intact = algorithm.digest(content) == claimed;
                    validation.digest = Some(Digest::new(algorithm, claimed));
                }
                Err(err) => {
                    log::warn!("signature {}: {err}", self.id);

                    log_item!(
                        "message_digest",
                        "message digest uses an unsupported algorithm",
                        "build_reference_validations"
                    )
                    .validation_status(validation_codes::REF_UNSUPPORTED_ALGORITHM)
                    .informational(tracker);
                }
            }
        }

        vec![validation]
    }

    /// Builds the signature's directly timestamped references: every
    /// certificate known to its certificate source and every revocation
    /// binary, in discovery order.
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

    /// Builds the reference list a new archive timestamp over this
    /// signature must cover, given the timestamps that already exist.
    pub fn references_for_new_archive_timestamp(
        &self,
        previous_timestamps: &[&TimestampToken],
        tracker: &mut StatusTracker,
    ) -> Vec<TimestampedReference> {
        let signature_reference =
            TimestampedReference::new(TimestampedObjectType::SignedData, self.id.clone());
        let direct = self.direct_timestamp_references(tracker);

        crate::time_stamp::references_for_archive_timestamp(
            &[signature_reference],
            previous_timestamps,
            &direct,
        )
    }

    fn decode_octet_string(der: &[u8]) -> Option<Vec<u8>> {
        Constructed::decode(der, Mode::Der, |cons| OctetString::take_from(cons))
            .ok()
            .map(|os| os.to_bytes().to_vec())
    }

    fn signed_attribute_der(&self, oid: &bcder::ConstOid) -> Option<&Vec<u8>> {
        match self.cms.signer.signed_attribute(oid)?.first_value()? {
            AttributeValue::Der(der) => Some(der),
            _ => None,
        }
    }

    fn has_signed_attribute(&self, oid: &bcder::ConstOid) -> bool {
        self.cms.signer.signed_attribute(oid).is_some()
    }

    fn has_unsigned_attribute(&self, oid: &bcder::ConstOid) -> bool {
        self.cms.signer.unsigned_attribute(oid).is_some()
    }

    fn build_signature_policy(
        &self,
        provider: &dyn SignaturePolicyProvider,
        tracker: &mut StatusTracker,
    ) -> Option<SignaturePolicy> {
        let attr = self.cms.signer.signed_attribute(&oids::SIG_POLICY_ID)?;

        let data = match attr.first_value()? {
            AttributeValue::SignaturePolicyId(data) => data,

            // An implied policy carries no identifier.
            _ => return Some(SignaturePolicy::default()),
        };

        let mut policy = SignaturePolicy {
            identifier: Some(data.policy_id.clone()),
            ..SignaturePolicy::default()
        };

        if let Some(digest) = &data.digest {
            match DigestAlgorithm::from_oid(&digest.algorithm_oid) {
                Ok(algorithm) => {
                    policy.digest = Some(Digest::new(algorithm, digest.value.clone()));
                }
                Err(err) => {
                    log::warn!("signature policy digest: {err}");

                    log_item!(
                        "signature_policy",
                        "policy digest uses an unsupported algorithm",
                        "build_signature_policy"
                    )
                    .validation_status(validation_codes::REF_UNSUPPORTED_ALGORITHM)
                    .informational(tracker);
                }
            }
        }

        for qualifier in &data.qualifiers {
            match qualifier {
                PolicyQualifierData::Uri(url) => {
                    policy.url = Some(url.clone());
                }
                PolicyQualifierData::UserNotice(notice) => {
                    policy.notice = Some(notice.clone());
                }
                PolicyQualifierData::Unknown { oid, .. } => {
                    log::info!("ignoring unknown policy qualifier {oid}");

                    log_item!(
                        "signature_policy",
                        "ignoring unknown policy qualifier",
                        "build_signature_policy"
                    )
                    .validation_status(validation_codes::POLICY_QUALIFIER_UNKNOWN)
                    .informational(tracker);
                }
            }
        }

        // Shared cache first, then the provider; a fetched document is
        // cached for other signatures declaring the same policy.
        policy.content = self.context.policy_store.get(&data.policy_id);

        if policy.content.is_none() {
            let fetched = match &policy.url {
                Some(url) => provider.policy_by_url(url),
                None => provider.policy_by_id(&data.policy_id),
            };

            if let Some(content) = fetched {
                self.context.policy_store.put(&data.policy_id, content.clone());
                policy.content = Some(content);
            }
        }

        Some(policy)
    }
}

impl AdvancedSignature for CadesSignature {
    fn id(&self) -> &str {
        &self.id
    }

    fn signature_form(&self) -> SignatureForm {
        SignatureForm::Cades
    }

    fn certificate_source(&self, tracker: &mut StatusTracker) -> &EmbeddedCertificateSource {
        self.cert_source
            .get_or_init(|| EmbeddedCertificateSource::from_cms(&self.cms, &self.context.pool, tracker))
    }

    fn crl_source(&self, tracker: &mut StatusTracker) -> &crate::revocation::crl::SignatureCrlSource {
        self.crl_source.get_or_init(|| {
            crate::revocation::crl::SignatureCrlSource::from_cms(
                &self.cms,
                self.parser.as_ref(),
                tracker,
            )
        })
    }

    fn ocsp_source(
        &self,
        tracker: &mut StatusTracker,
    ) -> &crate::revocation::ocsp::SignatureOcspSource {
        self.ocsp_source.get_or_init(|| {
            crate::revocation::ocsp::SignatureOcspSource::from_cms(
                &self.cms,
                self.parser.as_ref(),
                tracker,
            )
        })
    }

    fn timestamp_source(&self, tracker: &mut StatusTracker) -> &SignatureTimestampSource {
        self.timestamp_source.get_or_init(|| {
            let direct = self.direct_timestamp_references(tracker);

            SignatureTimestampSource::from_cms(
                &self.cms,
                &self.id,
                &direct,
                self.parser.as_ref(),
                &self.context.pool,
                tracker,
            )
        })
    }

    fn candidates_for_signing_certificate(
        &self,
        tracker: &mut StatusTracker,
    ) -> &CandidatesForSigningCertificate {
        self.candidates.get_or_init(|| self.build_candidates(tracker))
    }

    fn signing_time(&self, tracker: &mut StatusTracker) -> Option<DateTime<Utc>> {
        let der = self.signed_attribute_der(&oids::SIGNING_TIME)?;

        let time = match Constructed::decode(der.as_slice(), Mode::Der, Time::take_from) {
            Ok(time) => time,
            Err(e) => {
                log::warn!("signature {}: unparsable signing time: {e}", self.id);
                return None;
            }
        };

        let is_utc_encoding = matches!(time, Time::UtcTime(_));

        let instant: DateTime<Utc> = match time {
            Time::UtcTime(u) => *u,
            Time::GeneralTime(g) => g.into(),
        };

        // The encoding must match the date range; a mismatch is a
        // malformation signal, not a parse convenience.
        let in_utc_range = (UTC_TIME_RANGE_START..UTC_TIME_RANGE_END).contains(&instant.timestamp());

        if in_utc_range != is_utc_encoding {
            log::warn!(
                "signature {}: signing time encoding does not match its date range",
                self.id
            );

            log_item!(
                "signing_time",
                "signing time encoding does not match its date range",
                "signing_time"
            )
            .validation_status(validation_codes::SIGNING_TIME_ENCODING_INVALID)
            .informational(tracker);

            return None;
        }

        Some(instant)
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

            if self.cms.is_detached() && self.detached_content.is_none() {
                log::warn!("signature {}: detached content missing", self.id);

                log_item!(
                    "signature",
                    "detached signature validated without its content",
                    "check_signature_integrity"
                )
                .validation_status(validation_codes::DETACHED_CONTENT_MISSING)
                .informational(tracker);

                verification.error_message = Some("detached content missing".to_string());

                let _ = self.reference_validations.set(vec![ReferenceValidation {
                    kind: DigestMatcherKind::MessageDigest,
                    found: false,
                    intact: false,
                    digest: None,
                }]);

                return verification;
            }

            // Reference validation first, then the asymmetric check.
            let references = self.build_reference_validations(tracker);
            verification.reference_data_found =
                !references.is_empty() && references.iter().all(|r| r.found);
            verification.reference_data_intact =
                verification.reference_data_found && references.iter().all(|r| r.intact);
            let _ = self.reference_validations.set(references);

            let signed_bytes = match &self.cms.signer.signed_attributes_der {
                Some(der) => der.as_slice(),
                None => self.signed_content().unwrap_or(&[]),
            };

            match validator.validate(
                &self.cms.signer.signature,
                signed_bytes,
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

        let satisfied = match level {
            SignatureLevel::NotEtsi => true,

            SignatureLevel::BaselineB => {
                self.has_signed_attribute(&oids::SIGNING_CERTIFICATE)
                    || self.has_signed_attribute(&oids::SIGNING_CERTIFICATE_V2)
            }

            SignatureLevel::BaselineT => {
                self.is_data_for_level_present(SignatureLevel::BaselineB, tracker)?
                    && !self
                        .timestamp_source(tracker)
                        .signature_timestamps()
                        .is_empty()
            }

            SignatureLevel::C => {
                self.is_data_for_level_present(SignatureLevel::BaselineT, tracker)?
                    && self.has_unsigned_attribute(&oids::CERTIFICATE_REFS)
                    && self.has_unsigned_attribute(&oids::REVOCATION_REFS)
            }

            SignatureLevel::X => {
                self.is_data_for_level_present(SignatureLevel::C, tracker)?
                    && (self.has_unsigned_attribute(&oids::ESC_TIMESTAMP)
                        || self.has_unsigned_attribute(&oids::CERT_CRL_TIMESTAMP))
            }

            SignatureLevel::Xl => {
                self.is_data_for_level_present(SignatureLevel::X, tracker)?
                    && self.has_unsigned_attribute(&oids::CERT_VALUES)
                    && self.has_unsigned_attribute(&oids::REVOCATION_VALUES)
            }

            SignatureLevel::A => {
                self.is_data_for_level_present(SignatureLevel::Xl, tracker)?
                    && (self.has_unsigned_attribute(&oids::ARCHIVE_TIMESTAMP_V2)
                        || self.has_unsigned_attribute(&oids::ARCHIVE_TIMESTAMP_V3))
            }

            SignatureLevel::BaselineLt => {
                self.is_data_for_level_present(SignatureLevel::BaselineT, tracker)?
                    && (!self.timestamp_source(tracker).archive_timestamps().is_empty()
                        || (self.has_unsigned_attribute(&oids::CERTIFICATE_REFS)
                            && self.has_unsigned_attribute(&oids::REVOCATION_REFS)))
            }

            SignatureLevel::BaselineLta => {
                self.is_data_for_level_present(SignatureLevel::BaselineLt, tracker)?
                    && !self.timestamp_source(tracker).archive_timestamps().is_empty()
            }
        };

        Ok(satisfied)
    }

    fn signature_policy(
        &self,
        provider: &dyn SignaturePolicyProvider,
        tracker: &mut StatusTracker,
    ) -> Option<&SignaturePolicy> {
        self.policy
            .get_or_init(|| self.build_signature_policy(provider, tracker))
            .as_ref()
    }

    fn content_type(&self) -> Option<String> {
        let der = self.signed_attribute_der(&oids::CONTENT_TYPE)?;

        Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            Oid::<bytes::Bytes>::take_from(cons)
        })
        .ok()
        .map(|oid| oid.to_string())
    }

    fn message_digest(&self) -> Option<Vec<u8>> {
        let der = self.signed_attribute_der(&oids::MESSAGE_DIGEST)?;
        Self::decode_octet_string(der)
    }
}
