// Copyright 2022 Adobe. All rights reserved.
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

//! Status codes for the conditions identified while validating an AdES
//! signature.
//!
//! Codes ending in `.missing`, `.malformed`, or `.mismatch` describe
//! degraded-but-non-fatal conditions; the corresponding element is skipped
//! and validation continues.

// -- success codes --

/// The signing certificate was located among the signature's key-info
/// certificates.
pub const SIGNING_CERTIFICATE_FOUND: &str = "signingCertificate.found";

/// The signature value verified against the resolved signing certificate.
pub const SIGNATURE_INTACT: &str = "signature.intact";

/// An embedded timestamp token was decoded and its sources collected.
pub const TIMESTAMP_COLLECTED: &str = "timeStamp.collected";

// -- failure codes --

/// No certificate in the signature matched the claimed signer identifier.
pub const SIGNING_CERTIFICATE_NOT_FOUND: &str = "signingCertificate.notFound";

/// The first signed certificate reference did not match the resolved
/// signing certificate.
pub const SIGNING_CERTIFICATE_REF_MISMATCH: &str = "signingCertificate.refMismatch";

/// The signature is detached and no detached content was supplied.
pub const DETACHED_CONTENT_MISSING: &str = "detachedContent.missing";

/// The signature value did not verify against the resolved signing
/// certificate.
pub const SIGNATURE_NOT_INTACT: &str = "signature.notIntact";

/// An embedded timestamp token could not be decoded and was skipped.
pub const TIMESTAMP_MALFORMED: &str = "timeStamp.malformed";

/// A certificate or revocation reference uses a digest algorithm this
/// crate does not support; the reference was excluded from matching.
pub const REF_UNSUPPORTED_ALGORITHM: &str = "reference.unsupportedAlgorithm";

/// The signing-time attribute uses the wrong ASN.1 time encoding for its
/// date range and was rejected.
pub const SIGNING_TIME_ENCODING_INVALID: &str = "signingTime.invalidEncoding";

/// A signature policy qualifier was not recognized and was skipped.
pub const POLICY_QUALIFIER_UNKNOWN: &str = "signaturePolicy.unknownQualifier";

/// Returns `true` if the status code names a success condition.
pub fn is_success(code: &str) -> bool {
    matches!(
        code,
        SIGNING_CERTIFICATE_FOUND | SIGNATURE_INTACT | TIMESTAMP_COLLECTED
    )
}
