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

use std::sync::{Arc, Mutex};

use ades_status_tracker::{validation_codes, StatusTracker};
use chrono::{TimeZone, Utc};

use crate::{
    certificate::CertificateToken,
    cms::{
        oids, AttributeValue, CmsSignedData, DigestData, PolicyQualifierData, RevocationRefsData,
        SignaturePolicyIdData,
    },
    context::ValidationContext,
    digest::DigestAlgorithm,
    policy::SignaturePolicyProvider,
    signature::{
        AdvancedSignature, CadesSignature, DigestMatcherKind, PadesSignature, PdfDssDict,
        SignatureError, SignatureForm, SignatureLevel, XadesSignature, XadesSignatureData,
        XmlReferenceData,
    },
    tests::support::{
        attr, cades, cert_ref_data, cms, der_generalized_time, der_utc_time, message_digest_attr,
        revocation_values_attr, set_signed_attrs, set_unsigned_attrs, sid_for, signer_info,
        signer_token, signing_cert_attr, StubParser, StubValidator, OTHER_DER, SIGNER_DER,
    },
};

fn other_token() -> CertificateToken {
    CertificateToken::from_der(OTHER_DER).unwrap()
}

/// A CMS structure with an embedded signer certificate, a matching signed
/// signing-certificate reference, and a message digest over `content`.
fn baseline_cms(content: &[u8]) -> CmsSignedData {
    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));

    set_signed_attrs(
        &mut signer,
        vec![
            signing_cert_attr(vec![cert_ref_data(&token, DigestAlgorithm::Sha256)]),
            message_digest_attr(content),
        ],
    );

    cms(vec![SIGNER_DER.to_vec()], Some(content.to_vec()), signer)
}

#[test]
fn sources_are_computed_once() {
    let mut tracker = StatusTracker::default();
    let signature = cades(baseline_cms(b"hello"));

    let first = signature.certificate_source(&mut tracker);
    let second = signature.certificate_source(&mut tracker);
    assert!(std::ptr::eq(first, second));

    let first = signature.timestamp_source(&mut tracker);
    let second = signature.timestamp_source(&mut tracker);
    assert!(std::ptr::eq(first, second));

    let first = signature.candidates_for_signing_certificate(&mut tracker);
    let second = signature.candidates_for_signing_certificate(&mut tracker);
    assert!(std::ptr::eq(first, second));
}

#[test]
fn signer_identifier_elects_the_best_candidate() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let signer = signer_info(sid_for(&token));
    let signature = cades(cms(
        vec![OTHER_DER.to_vec(), SIGNER_DER.to_vec()],
        None,
        signer,
    ));

    let candidates = signature.candidates_for_signing_certificate(&mut tracker);

    assert_eq!(candidates.candidates().len(), 2);
    assert_eq!(
        candidates.best_token().map(|t| t.id().to_owned()),
        Some(token.id().to_owned())
    );
    assert!(tracker.has_status(validation_codes::SIGNING_CERTIFICATE_FOUND));
}

#[test]
fn unmatched_signer_identifier_is_informational() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let signer = signer_info(sid_for(&token));
    let signature = cades(cms(vec![OTHER_DER.to_vec()], None, signer));

    let candidates = signature.candidates_for_signing_certificate(&mut tracker);

    assert!(candidates.best_token().is_none());
    assert!(tracker.has_status(validation_codes::SIGNING_CERTIFICATE_NOT_FOUND));
    assert!(!tracker.has_any_error());
}

#[test]
fn provided_certificate_overrides_discovery() {
    let mut tracker = StatusTracker::default();

    let provided = Arc::new(other_token());
    let signature = cades(baseline_cms(b"hello"))
        .with_provided_signing_certificate(provided.clone());

    let candidates = signature.candidates_for_signing_certificate(&mut tracker);

    assert_eq!(candidates.candidates().len(), 1);
    assert_eq!(
        candidates.best_token().map(|t| t.id().to_owned()),
        Some(provided.id().to_owned())
    );
}

#[test]
fn only_the_first_signing_certificate_ref_is_authoritative() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(
        &mut signer,
        vec![signing_cert_attr(vec![
            cert_ref_data(&token, DigestAlgorithm::Sha256),
            cert_ref_data(&other_token(), DigestAlgorithm::Sha256),
        ])],
    );

    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer));
    let best = signature
        .candidates_for_signing_certificate(&mut tracker)
        .best_candidate()
        .unwrap();

    assert!(best.attribute_present);
    assert!(best.digest_present);
    assert!(best.digest_equal);
    assert!(!tracker.has_status(validation_codes::SIGNING_CERTIFICATE_REF_MISMATCH));
}

#[test]
fn mismatching_first_ref_is_reported_but_not_fatal() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(
        &mut signer,
        vec![signing_cert_attr(vec![
            cert_ref_data(&other_token(), DigestAlgorithm::Sha256),
            cert_ref_data(&token, DigestAlgorithm::Sha256),
        ])],
    );

    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer));
    let best = signature
        .candidates_for_signing_certificate(&mut tracker)
        .best_candidate()
        .unwrap();

    // The signer identifier still elects the candidate; the reference
    // mismatch is recorded against it.
    assert!(best.signer_id_match);
    assert!(best.digest_present);
    assert!(!best.digest_equal);
    assert!(tracker.has_status(validation_codes::SIGNING_CERTIFICATE_REF_MISMATCH));
}

#[test]
fn integrity_check_passes_with_intact_references() {
    let mut tracker = StatusTracker::default();
    let signature = cades(baseline_cms(b"hello"));

    let verification =
        signature.check_signature_integrity(&StubValidator { ok: true }, &mut tracker);

    assert!(verification.reference_data_found);
    assert!(verification.reference_data_intact);
    assert!(verification.signature_intact);
    assert!(verification.is_signature_valid());
    assert!(tracker.has_status(validation_codes::SIGNATURE_INTACT));

    let references = signature.reference_validations();
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].kind, DigestMatcherKind::MessageDigest);
    assert!(references[0].intact);
}

#[test]
fn integrity_failure_is_captured_not_propagated() {
    let mut tracker = StatusTracker::default();
    let signature = cades(baseline_cms(b"hello"));

    let verification =
        signature.check_signature_integrity(&StubValidator { ok: false }, &mut tracker);

    assert!(!verification.signature_intact);
    assert!(verification.error_message.is_some());
    assert!(tracker.has_status(validation_codes::SIGNATURE_NOT_INTACT));

    // The verdict is cached; a later call with a passing validator does
    // not change it.
    let again = signature.check_signature_integrity(&StubValidator { ok: true }, &mut tracker);
    assert!(!again.signature_intact);
}

#[test]
fn tampered_content_breaks_the_reference_check() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(
        &mut signer,
        vec![
            signing_cert_attr(vec![cert_ref_data(&token, DigestAlgorithm::Sha256)]),
            message_digest_attr(b"hello"),
        ],
    );

    let signature = cades(cms(
        vec![SIGNER_DER.to_vec()],
        Some(b"tampered".to_vec()),
        signer,
    ));

    let verification =
        signature.check_signature_integrity(&StubValidator { ok: true }, &mut tracker);

    assert!(verification.reference_data_found);
    assert!(!verification.reference_data_intact);
    assert!(!verification.is_signature_valid());
}

#[test]
fn detached_signature_without_content_gets_a_named_verdict() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(&mut signer, vec![message_digest_attr(b"hello")]);

    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer));

    let verification =
        signature.check_signature_integrity(&StubValidator { ok: true }, &mut tracker);

    assert!(!verification.is_signature_valid());
    assert_eq!(
        verification.error_message.as_deref(),
        Some("detached content missing")
    );
    assert!(tracker.has_status(validation_codes::DETACHED_CONTENT_MISSING));

    let references = signature.reference_validations();
    assert_eq!(references.len(), 1);
    assert!(!references[0].found);
}

#[test]
fn detached_signature_with_supplied_content_validates() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(&mut signer, vec![message_digest_attr(b"hello")]);

    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer))
        .with_detached_content(b"hello".to_vec());

    let verification =
        signature.check_signature_integrity(&StubValidator { ok: true }, &mut tracker);

    assert!(verification.is_signature_valid());
}

#[test]
fn signing_time_accepts_utc_encoding_in_range() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(
        &mut signer,
        vec![attr(
            &oids::SIGNING_TIME,
            vec![AttributeValue::Der(der_utc_time("100101120000Z"))],
        )],
    );

    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer));

    assert_eq!(
        signature.signing_time(&mut tracker),
        Utc.with_ymd_and_hms(2010, 1, 1, 12, 0, 0).single()
    );
}

#[test]
fn signing_time_rejects_generalized_encoding_in_utc_range() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(
        &mut signer,
        vec![attr(
            &oids::SIGNING_TIME,
            vec![AttributeValue::Der(der_generalized_time("20100101120000Z"))],
        )],
    );

    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer));

    assert!(signature.signing_time(&mut tracker).is_none());
    assert!(tracker.has_status(validation_codes::SIGNING_TIME_ENCODING_INVALID));
}

#[test]
fn signing_time_accepts_generalized_encoding_after_2049() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(
        &mut signer,
        vec![attr(
            &oids::SIGNING_TIME,
            vec![AttributeValue::Der(der_generalized_time("20550101120000Z"))],
        )],
    );

    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer));

    assert_eq!(
        signature.signing_time(&mut tracker),
        Utc.with_ymd_and_hms(2055, 1, 1, 12, 0, 0).single()
    );
}

#[test]
fn content_type_decodes_to_dotted_decimal() {
    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));

    // id-data, DER-encoded.
    let oid_der = vec![0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x01];
    set_signed_attrs(
        &mut signer,
        vec![attr(&oids::CONTENT_TYPE, vec![AttributeValue::Der(oid_der)])],
    );

    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer));

    assert_eq!(
        signature.content_type().as_deref(),
        Some("1.2.840.113549.1.7.1")
    );
    assert!(signature.message_digest().is_none());
}

fn cades_with_attrs(unsigned: Vec<crate::cms::Attribute>) -> CadesSignature {
    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(
        &mut signer,
        vec![signing_cert_attr(vec![cert_ref_data(
            &token,
            DigestAlgorithm::Sha256,
        )])],
    );
    set_unsigned_attrs(&mut signer, unsigned);
    cades(cms(vec![SIGNER_DER.to_vec()], None, signer))
}

fn timestamp_attr(oid: &bcder::ConstOid, encoded: &[u8]) -> crate::cms::Attribute {
    attr(oid, vec![AttributeValue::TimestampToken(encoded.to_vec())])
}

#[test]
fn cades_level_is_b_with_only_the_signed_reference() {
    let mut tracker = StatusTracker::default();
    let signature = cades_with_attrs(Vec::new());

    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::BaselineB
    );
}

#[test]
fn cades_level_is_not_etsi_without_the_signed_reference() {
    let mut tracker = StatusTracker::default();

    let token = signer_token();
    let signer = signer_info(sid_for(&token));
    let signature = cades(cms(vec![SIGNER_DER.to_vec()], None, signer));

    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::NotEtsi
    );
}

#[test]
fn signature_timestamp_raises_the_level_to_t() {
    let mut tracker = StatusTracker::default();
    let signature = cades_with_attrs(vec![timestamp_attr(&oids::SIGNATURE_TIMESTAMP, b"ts-1")]);

    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::BaselineT
    );
}

#[test]
fn complete_references_raise_the_level_to_lt() {
    let mut tracker = StatusTracker::default();
    let signature = cades_with_attrs(vec![
        timestamp_attr(&oids::SIGNATURE_TIMESTAMP, b"ts-1"),
        attr(
            &oids::CERTIFICATE_REFS,
            vec![AttributeValue::CertificateRefs(Vec::new())],
        ),
        attr(
            &oids::REVOCATION_REFS,
            vec![AttributeValue::RevocationRefs(RevocationRefsData::default())],
        ),
    ]);

    // C is satisfied along the way, but LT is evaluated later and wins.
    assert!(signature
        .is_data_for_level_present(SignatureLevel::C, &mut tracker)
        .unwrap());
    assert!(!signature
        .is_data_for_level_present(SignatureLevel::X, &mut tracker)
        .unwrap());
    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::BaselineLt
    );
}

#[test]
fn the_full_legacy_chain_reaches_lta() {
    let mut tracker = StatusTracker::default();
    let signature = cades_with_attrs(vec![
        timestamp_attr(&oids::SIGNATURE_TIMESTAMP, b"ts-1"),
        attr(
            &oids::CERTIFICATE_REFS,
            vec![AttributeValue::CertificateRefs(Vec::new())],
        ),
        attr(
            &oids::REVOCATION_REFS,
            vec![AttributeValue::RevocationRefs(RevocationRefsData::default())],
        ),
        timestamp_attr(&oids::ESC_TIMESTAMP, b"ts-2"),
        attr(
            &oids::CERT_VALUES,
            vec![AttributeValue::Certificates(Vec::new())],
        ),
        revocation_values_attr(Vec::new(), Vec::new()),
        timestamp_attr(&oids::ARCHIVE_TIMESTAMP_V3, b"ts-3"),
    ]);

    for level in [
        SignatureLevel::X,
        SignatureLevel::Xl,
        SignatureLevel::A,
        SignatureLevel::BaselineLta,
    ] {
        assert!(
            signature.is_data_for_level_present(level, &mut tracker).unwrap(),
            "{level} should be satisfied"
        );
    }

    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::BaselineLta
    );
}

#[test]
fn pades_rejects_levels_it_does_not_define() {
    let mut tracker = StatusTracker::default();
    let signature = PadesSignature::new(cades(baseline_cms(b"hello")));

    let err = signature
        .is_data_for_level_present(SignatureLevel::C, &mut tracker)
        .unwrap_err();

    assert_eq!(
        err,
        SignatureError::UnknownLevel {
            level: SignatureLevel::C,
            form: SignatureForm::Pades,
        }
    );
    assert_eq!(
        err.to_string(),
        "signature level C is not applicable to PAdES"
    );
}

fn pades_baseline() -> CadesSignature {
    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    set_signed_attrs(
        &mut signer,
        vec![signing_cert_attr(vec![cert_ref_data(
            &token,
            DigestAlgorithm::Sha256,
        )])],
    );
    cades(cms(vec![SIGNER_DER.to_vec()], None, signer))
}

#[test]
fn document_timestamp_satisfies_pades_t() {
    let mut tracker = StatusTracker::default();

    let signature =
        PadesSignature::new(pades_baseline()).with_document_timestamp(b"doc-ts".to_vec());

    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::BaselineT
    );
}

#[test]
fn dss_dictionary_and_document_timestamp_reach_pades_lta() {
    let mut tracker = StatusTracker::default();

    let dss = PdfDssDict {
        certs: vec![SIGNER_DER.to_vec()],
        crls: vec![b"crl-bytes".to_vec()],
        ..PdfDssDict::default()
    };

    let signature = PadesSignature::new(pades_baseline())
        .with_dss_dict(dss)
        .with_document_timestamp(b"doc-ts".to_vec());

    assert!(signature.dss_dict().is_some());
    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::BaselineLta
    );

    // The document timestamp covers the signature and the catalogued data.
    let document_ts = &signature.timestamp_source(&mut tracker).document_timestamps()[0];
    assert!(!document_ts.timestamped_references().is_empty());
}

#[test]
fn pades_without_revocation_data_stops_at_t() {
    let mut tracker = StatusTracker::default();

    let dss = PdfDssDict {
        certs: vec![SIGNER_DER.to_vec()],
        ..PdfDssDict::default()
    };

    let signature = PadesSignature::new(pades_baseline())
        .with_dss_dict(dss)
        .with_document_timestamp(b"doc-ts".to_vec());

    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::BaselineT
    );
}

#[test]
fn pades_dictionary_date_takes_precedence() {
    let mut tracker = StatusTracker::default();

    let date = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).single().unwrap();
    let signature =
        PadesSignature::new(pades_baseline()).with_dictionary_signing_date(date);

    assert_eq!(signature.signing_time(&mut tracker), Some(date));
}

fn xades_data(content: &[u8]) -> XadesSignatureData {
    let token = signer_token();

    XadesSignatureData {
        key_info_certificates: vec![SIGNER_DER.to_vec()],
        signing_certificate_refs: vec![cert_ref_data(&token, DigestAlgorithm::Sha256)],
        signed_info: b"signed-info".to_vec(),
        signature_value: b"signature-value".to_vec(),
        references: vec![XmlReferenceData {
            uri: "#signed-object".to_string(),
            digest: DigestData {
                algorithm_oid: DigestAlgorithm::Sha256.oid().to_vec(),
                value: DigestAlgorithm::Sha256.digest(content),
            },
            resolved_content: Some(content.to_vec()),
        }],
        ..XadesSignatureData::default()
    }
}

fn xades(data: XadesSignatureData) -> XadesSignature {
    XadesSignature::new(
        data,
        Arc::new(StubParser::default()),
        Arc::new(ValidationContext::new()),
    )
}

#[test]
fn xades_integrity_with_resolved_references() {
    let mut tracker = StatusTracker::default();
    let signature = xades(xades_data(b"<payload/>"));

    let verification =
        signature.check_signature_integrity(&StubValidator { ok: true }, &mut tracker);

    assert!(verification.is_signature_valid());
    assert_eq!(signature.reference_validations().len(), 1);
    assert_eq!(
        signature.reference_validations()[0].kind,
        DigestMatcherKind::XmlReference
    );
}

#[test]
fn xades_unresolved_reference_fails_the_reference_check() {
    let mut tracker = StatusTracker::default();

    let mut data = xades_data(b"<payload/>");
    data.references[0].resolved_content = None;

    let signature = xades(data);
    let verification =
        signature.check_signature_integrity(&StubValidator { ok: true }, &mut tracker);

    assert!(!verification.reference_data_found);
    assert!(!verification.is_signature_valid());
}

#[test]
fn xades_levels_follow_the_declared_elements() {
    let mut tracker = StatusTracker::default();

    let mut data = xades_data(b"<payload/>");
    data.signature_timestamps = vec![b"ts-1".to_vec()];
    data.archive_timestamps = vec![b"ts-arch".to_vec()];

    let signature = xades(data);

    assert_eq!(signature.signature_form(), SignatureForm::Xades);
    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::BaselineLta
    );
}

#[test]
fn xades_without_signing_certificate_element_is_not_etsi() {
    let mut tracker = StatusTracker::default();

    let mut data = xades_data(b"<payload/>");
    data.signing_certificate_refs.clear();

    let signature = xades(data);

    assert_eq!(
        signature.signature_level(&mut tracker).unwrap(),
        SignatureLevel::NotEtsi
    );
}

struct CountingProvider {
    calls: Mutex<usize>,
    content: Vec<u8>,
}

impl CountingProvider {
    fn new(content: &[u8]) -> Self {
        Self {
            calls: Mutex::new(0),
            content: content.to_vec(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }

    fn record(&self) -> Option<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        Some(self.content.clone())
    }
}

impl SignaturePolicyProvider for CountingProvider {
    fn policy_by_id(&self, _id: &str) -> Option<Vec<u8>> {
        self.record()
    }

    fn policy_by_url(&self, _url: &str) -> Option<Vec<u8>> {
        self.record()
    }
}

fn cms_with_policy(signature_value: &[u8]) -> CmsSignedData {
    let token = signer_token();
    let mut signer = signer_info(sid_for(&token));
    signer.signature = signature_value.to_vec();

    set_signed_attrs(
        &mut signer,
        vec![attr(
            &oids::SIG_POLICY_ID,
            vec![AttributeValue::SignaturePolicyId(SignaturePolicyIdData {
                policy_id: "1.3.6.1.4.1.10015.1000.3.2.1".to_string(),
                digest: Some(DigestData {
                    algorithm_oid: DigestAlgorithm::Sha256.oid().to_vec(),
                    value: DigestAlgorithm::Sha256.digest(b"policy-document"),
                }),
                qualifiers: vec![PolicyQualifierData::Uri(
                    "https://example.com/policy.der".to_string(),
                )],
            })],
        )],
    );

    cms(vec![SIGNER_DER.to_vec()], None, signer)
}

#[test]
fn policy_is_fetched_once_and_shared_through_the_context() {
    let mut tracker = StatusTracker::default();
    let context = Arc::new(ValidationContext::new());
    let parser: Arc<StubParser> = Arc::new(StubParser::default());

    let first = CadesSignature::new(cms_with_policy(b"sig-a"), parser.clone(), context.clone());
    let second = CadesSignature::new(cms_with_policy(b"sig-b"), parser, context);

    let provider = CountingProvider::new(b"policy-document");
    let policy = first.signature_policy(&provider, &mut tracker).unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(policy.url.as_deref(), Some("https://example.com/policy.der"));
    assert_eq!(policy.content.as_deref(), Some(b"policy-document".as_slice()));
    assert_eq!(policy.digest_matches(), Some(true));

    // The second signature resolves from the shared cache; its provider is
    // never consulted.
    let unused = CountingProvider::new(b"different-document");
    let cached = second.signature_policy(&unused, &mut tracker).unwrap();

    assert_eq!(unused.calls(), 0);
    assert_eq!(cached.content.as_deref(), Some(b"policy-document".as_slice()));
}

#[test]
fn policy_digest_mismatch_is_detectable() {
    let mut tracker = StatusTracker::default();
    let signature = cades(cms_with_policy(b"sig-c"));

    let provider = CountingProvider::new(b"substituted-document");
    let policy = signature.signature_policy(&provider, &mut tracker).unwrap();

    assert_eq!(policy.digest_matches(), Some(false));
}
