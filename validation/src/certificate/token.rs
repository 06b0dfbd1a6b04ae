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

use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    sync::Mutex,
};

use thiserror::Error;
use x509_parser::prelude::*;

use crate::digest::{Digest, DigestAlgorithm};

/// One X.509 certificate with the fields the validation model inspects
/// extracted into owned storage.
///
/// Identity is the DER encoding: two tokens are equal when their encodings
/// are byte-equal. Per-algorithm digests over the encoding are computed on
/// first request and cached for the lifetime of the token.
#[derive(Debug)]
pub struct CertificateToken {
    der: Vec<u8>,
    id: String,
    subject: String,
    issuer: String,
    issuer_name_der: Vec<u8>,
    serial: Vec<u8>,
    public_key_der: Vec<u8>,
    subject_key_identifier: Option<Vec<u8>>,
    not_before: i64,
    not_after: i64,
    digests: Mutex<HashMap<DigestAlgorithm, Vec<u8>>>,
}

impl CertificateToken {
    /// Parses a DER-encoded certificate into a token.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| CertificateError::Parse(format!("{e:?}")))?;

        let subject_key_identifier = cert.extensions().iter().find_map(|ext| {
            if let ParsedExtension::SubjectKeyIdentifier(KeyIdentifier(ski)) =
                ext.parsed_extension()
            {
                Some(ski.to_vec())
            } else {
                None
            }
        });

        Ok(Self {
            id: hex::encode(DigestAlgorithm::Sha256.digest(der)),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            issuer_name_der: cert.issuer().as_raw().to_vec(),
            serial: cert.tbs_certificate.raw_serial().to_vec(),
            public_key_der: cert.tbs_certificate.subject_pki.raw.to_vec(),
            subject_key_identifier,
            not_before: cert.validity().not_before.timestamp(),
            not_after: cert.validity().not_after.timestamp(),
            der: der.to_vec(),
            digests: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the unique identifier of this token (hex-encoded SHA-256 of
    /// the DER encoding).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the subject distinguished name as a display string.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the issuer distinguished name as a display string.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the DER encoding of the issuer `Name`.
    pub fn issuer_name_der(&self) -> &[u8] {
        &self.issuer_name_der
    }

    /// Returns the serial number, big-endian bytes.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    /// Returns the DER encoding of the `SubjectPublicKeyInfo`.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// Returns the subject key identifier extension value, if present.
    pub fn subject_key_identifier(&self) -> Option<&[u8]> {
        self.subject_key_identifier.as_deref()
    }

    /// Returns the start of the validity period (seconds since the Unix
    /// epoch).
    pub fn not_before(&self) -> i64 {
        self.not_before
    }

    /// Returns the end of the validity period (seconds since the Unix
    /// epoch).
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    /// Returns the digest of the DER encoding under `algorithm`, computing
    /// it on first request.
    pub fn digest(&self, algorithm: DigestAlgorithm) -> Vec<u8> {
        match self.digests.lock() {
            Ok(mut cache) => cache
                .entry(algorithm)
                .or_insert_with(|| algorithm.digest(&self.der))
                .clone(),

            // A poisoned cache only loses memoization.
            Err(_) => algorithm.digest(&self.der),
        }
    }

    /// Returns `true` when `digest` is the digest of this token's encoding.
    pub fn matches_digest(&self, digest: &Digest) -> bool {
        self.digest(digest.algorithm) == digest.value
    }
}

impl PartialEq for CertificateToken {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for CertificateToken {}

impl Hash for CertificateToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl fmt::Display for CertificateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Certificate[{}, subject={}]", &self.id[..8.min(self.id.len())], self.subject)
    }
}

/// Describes errors that can occur when working with certificate tokens and
/// the certificate pool.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// The certificate could not be parsed.
    #[error("unable to parse certificate ({0})")]
    Parse(String),

    /// The certificate pool lock was poisoned by a panicking thread.
    #[error("certificate pool lock poisoned")]
    PoolLock,
}
