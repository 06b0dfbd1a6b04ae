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

use ades_status_tracker::{validation_codes, StatusTracker};

use crate::{
    certificate::CertificatePool,
    cms::{oids, AttributeValue, DigestData, ParsedTimestamp},
    digest::DigestAlgorithm,
    tests::support::{
        attr, cms, empty_cms, fixed_time, set_unsigned_attrs, sid_for, signer_info, signer_token,
        StubParser,
    },
    time_stamp::{
        references_for_archive_timestamp, SignatureTimestampSource, TimestampToken, TimestampType,
        TimestampedObjectType, TimestampedReference,
    },
};

fn parsed_over(data: &[u8]) -> ParsedTimestamp {
    ParsedTimestamp {
        signed_data: empty_cms(),
        gen_time: fixed_time(),
        message_imprint: DigestData {
            algorithm_oid: DigestAlgorithm::Sha256.oid().to_vec(),
            value: DigestAlgorithm::Sha256.digest(data),
        },
    }
}

fn token_over(encoded: &[u8], ts_type: TimestampType, data: &[u8]) -> TimestampToken {
    let mut tracker = StatusTracker::default();
    TimestampToken::new(
        encoded.to_vec(),
        ts_type,
        &parsed_over(data),
        &CertificatePool::new(),
        &mut tracker,
    )
}

fn reference(object_type: TimestampedObjectType, id: &str) -> TimestampedReference {
    TimestampedReference::new(object_type, id)
}

#[test]
fn archive_coverage_is_the_ordered_union() {
    let signature_ref = reference(TimestampedObjectType::SignedData, "sig-1");

    let mut ts_one = token_over(b"ts-one", TimestampType::SignatureTimestamp, b"x");
    ts_one.set_timestamped_references(vec![
        reference(TimestampedObjectType::Certificate, "cert-a"),
        reference(TimestampedObjectType::Certificate, "cert-b"),
    ]);

    let mut ts_two = token_over(b"ts-two", TimestampType::ValidationDataTimestamp, b"x");
    ts_two.set_timestamped_references(vec![
        reference(TimestampedObjectType::Certificate, "cert-b"),
        reference(TimestampedObjectType::Revocation, "crl-c"),
    ]);

    let direct = vec![reference(TimestampedObjectType::Revocation, "ocsp-d")];

    let coverage = references_for_archive_timestamp(
        std::slice::from_ref(&signature_ref),
        &[&ts_one, &ts_two],
        &direct,
    );

    assert_eq!(
        coverage,
        vec![
            signature_ref,
            reference(TimestampedObjectType::Timestamp, ts_one.id()),
            reference(TimestampedObjectType::Certificate, "cert-a"),
            reference(TimestampedObjectType::Certificate, "cert-b"),
            reference(TimestampedObjectType::Timestamp, ts_two.id()),
            reference(TimestampedObjectType::Revocation, "crl-c"),
            reference(TimestampedObjectType::Revocation, "ocsp-d"),
        ]
    );
}

#[test]
fn archive_coverage_deduplicates_overlapping_claims() {
    let shared = reference(TimestampedObjectType::Certificate, "cert-a");

    let coverage = references_for_archive_timestamp(
        std::slice::from_ref(&shared),
        &[],
        std::slice::from_ref(&shared),
    );

    assert_eq!(coverage.len(), 1);
}

#[test]
fn message_imprint_comparison() {
    let mut tracker = StatusTracker::default();
    let token = token_over(b"enc", TimestampType::SignatureTimestamp, b"covered data");

    assert!(token.matches_data(b"covered data", &mut tracker));
    assert!(!token.matches_data(b"tampered data", &mut tracker));
}

#[test]
fn unsupported_imprint_algorithm_is_a_mismatch() {
    let mut tracker = StatusTracker::default();

    let parsed = ParsedTimestamp {
        signed_data: empty_cms(),
        gen_time: fixed_time(),
        message_imprint: DigestData {
            algorithm_oid: vec![9, 9, 9],
            value: vec![0u8; 20],
        },
    };

    let token = TimestampToken::new(
        b"enc".to_vec(),
        TimestampType::SignatureTimestamp,
        &parsed,
        &CertificatePool::new(),
        &mut tracker,
    );

    assert!(!token.matches_data(b"anything", &mut tracker));
    assert!(tracker.has_status(validation_codes::REF_UNSUPPORTED_ALGORITHM));
}

#[test]
fn token_identity_is_digest_of_encoding() {
    let token = token_over(b"ts-one", TimestampType::SignatureTimestamp, b"x");

    assert_eq!(
        token.id(),
        hex::encode(DigestAlgorithm::Sha256.digest(b"ts-one"))
    );
    assert_eq!(token.encoded(), b"ts-one");
    assert_eq!(token.gen_time(), fixed_time());
    assert!(TimestampType::ArchiveTimestampV2.is_archive());
    assert!(!token.ts_type().is_archive());
}

#[test]
fn source_groups_tokens_by_role_and_seeds_coverage() {
    let mut tracker = StatusTracker::default();
    let pool = CertificatePool::new();

    let signer_cert = signer_token();
    let mut signer = signer_info(sid_for(&signer_cert));
    set_unsigned_attrs(
        &mut signer,
        vec![
            attr(
                &oids::SIGNATURE_TIMESTAMP,
                vec![AttributeValue::TimestampToken(b"ts-one".to_vec())],
            ),
            attr(
                &oids::ARCHIVE_TIMESTAMP_V3,
                vec![AttributeValue::TimestampToken(b"ts-arch".to_vec())],
            ),
        ],
    );

    let direct = vec![reference(TimestampedObjectType::Certificate, "cert-a")];

    let source = SignatureTimestampSource::from_cms(
        &cms(Vec::new(), None, signer),
        "sig-1",
        &direct,
        &StubParser::default(),
        &pool,
        &mut tracker,
    );

    assert_eq!(source.signature_timestamps().len(), 1);
    assert_eq!(source.archive_timestamps().len(), 1);
    assert_eq!(source.all().len(), 2);
    assert!(tracker.has_status(validation_codes::TIMESTAMP_COLLECTED));

    let signature_ts = &source.signature_timestamps()[0];
    assert_eq!(
        signature_ts.timestamped_references(),
        &[reference(TimestampedObjectType::SignedData, "sig-1")]
    );

    let archive_ts = &source.archive_timestamps()[0];
    assert_eq!(archive_ts.ts_type(), TimestampType::ArchiveTimestampV3);
    assert_eq!(
        archive_ts.timestamped_references(),
        &[
            reference(TimestampedObjectType::SignedData, "sig-1"),
            reference(TimestampedObjectType::Timestamp, signature_ts.id()),
            reference(TimestampedObjectType::Certificate, "cert-a"),
        ]
    );
}

#[test]
fn malformed_token_is_skipped_and_reported() {
    let mut tracker = StatusTracker::default();
    let pool = CertificatePool::new();

    let signer_cert = signer_token();
    let mut signer = signer_info(sid_for(&signer_cert));
    set_unsigned_attrs(
        &mut signer,
        vec![attr(
            &oids::SIGNATURE_TIMESTAMP,
            vec![AttributeValue::TimestampToken(b"bad-ts".to_vec())],
        )],
    );

    let source = SignatureTimestampSource::from_cms(
        &cms(Vec::new(), None, signer),
        "sig-1",
        &[],
        &StubParser::default(),
        &pool,
        &mut tracker,
    );

    assert!(source.signature_timestamps().is_empty());
    assert!(source.all().is_empty());
    assert!(tracker.has_status(validation_codes::TIMESTAMP_MALFORMED));
}
