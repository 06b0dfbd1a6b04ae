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

//! Format-specific signature objects and the capability set they share.

mod cades;
mod level;
mod pades;
mod xades;

use std::fmt;

use ades_status_tracker::StatusTracker;
pub use cades::CadesSignature;
use chrono::{DateTime, Utc};
pub use level::SignatureLevel;
pub use pades::{PadesSignature, PdfDssDict, PdfVriDict};
use thiserror::Error;
pub use xades::{XadesSignature, XadesSignatureData, XmlReferenceData};

use crate::{
    certificate::{CandidatesForSigningCertificate, EmbeddedCertificateSource},
    digest::Digest,
    policy::{SignaturePolicy, SignaturePolicyProvider},
    raw_signature::RawSignatureValidator,
    revocation::{crl::SignatureCrlSource, ocsp::SignatureOcspSource},
    time_stamp::SignatureTimestampSource,
};

/// The signature format a signature object implements.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureForm {
    /// CMS-based advanced electronic signature.
    Cades,

    /// XML-based advanced electronic signature.
    Xades,

    /// PDF-embedded advanced electronic signature.
    Pades,
}

impl fmt::Display for SignatureForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cades => write!(f, "CAdES"),
            Self::Xades => write!(f, "XAdES"),
            Self::Pades => write!(f, "PAdES"),
        }
    }
}

/// The kind of reference checked during reference validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DigestMatcherKind {
    /// The CMS message-digest attribute over the signed content.
    MessageDigest,

    /// An XML signature reference resolved against its target.
    XmlReference,
}

/// Outcome of validating one reference: was the referenced data found,
/// did its digest match, and what digest was claimed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferenceValidation {
    /// The kind of reference.
    pub kind: DigestMatcherKind,

    /// The referenced data was located.
    pub found: bool,

    /// The claimed digest matches the referenced data.
    pub intact: bool,

    /// The digest the signature claims, when it could be interpreted.
    pub digest: Option<Digest>,
}

/// The cryptographic-integrity verdict for one signature.
///
/// Populated by `check_signature_integrity`; a failed check leaves the
/// signature object queryable, with the reason captured here rather than
/// propagated.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignatureCryptographicVerification {
    /// Every piece of referenced data was located.
    pub reference_data_found: bool,

    /// Every reference digest matched.
    pub reference_data_intact: bool,

    /// The asymmetric signature verified against the resolved public key.
    pub signature_intact: bool,

    /// Why verification failed, when it did.
    pub error_message: Option<String>,
}

impl SignatureCryptographicVerification {
    /// Returns `true` when references were found and intact and the
    /// signature verified.
    pub fn is_signature_valid(&self) -> bool {
        self.reference_data_found && self.reference_data_intact && self.signature_intact
    }
}

/// Describes errors arising from signature-level queries.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SignatureError {
    /// The requested baseline level does not exist for the signature's
    /// format. This indicates caller misuse and is the one intentionally
    /// fatal condition.
    #[error("signature level {level} is not applicable to {form}")]
    UnknownLevel {
        /// The requested level.
        level: SignatureLevel,

        /// The signature's format.
        form: SignatureForm,
    },
}

/// The capability set shared by every signature format: evidence sources,
/// signing-certificate resolution, integrity checking, and baseline-level
/// satisfaction.
///
/// Accessors are lazy: the first call populates the underlying source and
/// later calls return the same value without re-scanning. The
/// `StatusTracker` collects structured warnings for degraded-but-non-fatal
/// conditions found along the way.
pub trait AdvancedSignature {
    /// Returns the stable identifier of this signature.
    fn id(&self) -> &str;

    /// Returns the signature format.
    fn signature_form(&self) -> SignatureForm;

    /// Returns the certificate evidence this signature carries.
    fn certificate_source(&self, tracker: &mut StatusTracker) -> &EmbeddedCertificateSource;

    /// Returns the CRL evidence this signature carries.
    fn crl_source(&self, tracker: &mut StatusTracker) -> &SignatureCrlSource;

    /// Returns the OCSP evidence this signature carries.
    fn ocsp_source(&self, tracker: &mut StatusTracker) -> &SignatureOcspSource;

    /// Returns the timestamp tokens this signature carries.
    fn timestamp_source(&self, tracker: &mut StatusTracker) -> &SignatureTimestampSource;

    /// Returns the signing-certificate candidates, with the best match
    /// elected when one could be resolved.
    fn candidates_for_signing_certificate(
        &self,
        tracker: &mut StatusTracker,
    ) -> &CandidatesForSigningCertificate;

    /// Returns the claimed signing time, or `None` when absent or
    /// malformed.
    fn signing_time(&self, tracker: &mut StatusTracker) -> Option<DateTime<Utc>>;

    /// Resolves the signing certificate, validates references, and
    /// verifies the signature value. The verdict is computed once;
    /// repeated calls return the same result.
    fn check_signature_integrity(
        &self,
        validator: &dyn RawSignatureValidator,
        tracker: &mut StatusTracker,
    ) -> &SignatureCryptographicVerification;

    /// Returns the per-reference validation results from the last
    /// integrity check, or an empty slice if none ran yet.
    fn reference_validations(&self) -> &[ReferenceValidation];

    /// Returns the levels that exist for this signature's format, ordered
    /// by increasing strength.
    fn signature_levels(&self) -> &'static [SignatureLevel];

    /// Returns `true` when the evidence required by `level` (and,
    /// recursively, by every level below it) is present.
    ///
    /// Requesting a level that does not exist for this format is a
    /// contract violation and fails with [`SignatureError::UnknownLevel`].
    fn is_data_for_level_present(
        &self,
        level: SignatureLevel,
        tracker: &mut StatusTracker,
    ) -> Result<bool, SignatureError>;

    /// Returns the highest level whose evidence is present.
    fn signature_level(
        &self,
        tracker: &mut StatusTracker,
    ) -> Result<SignatureLevel, SignatureError> {
        let mut satisfied = SignatureLevel::NotEtsi;

        for level in self.signature_levels() {
            if self.is_data_for_level_present(*level, tracker)? {
                satisfied = *level;
            }
        }

        Ok(satisfied)
    }

    /// Resolves the signature policy this signature declares, if any.
    fn signature_policy(
        &self,
        _provider: &dyn SignaturePolicyProvider,
        _tracker: &mut StatusTracker,
    ) -> Option<&SignaturePolicy> {
        None
    }

    /// Returns the declared content type, if the format carries one.
    fn content_type(&self) -> Option<String> {
        None
    }

    /// Returns the claimed message digest over the signed content, if the
    /// format carries one.
    fn message_digest(&self) -> Option<Vec<u8>> {
        None
    }
}
