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

use crate::{
    certificate::CertificateToken,
    cms::CertificateRefData,
    digest::{Digest, DigestAlgorithm, DigestError, IssuerSerialInfo},
};

/// Where a certificate reference was found within the signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CertificateRefOrigin {
    /// The signed signing-certificate attribute.
    SigningCertificate,

    /// The unsigned complete-certificate-references attribute.
    CompleteCertificateRefs,

    /// The unsigned attribute-certificate-references attribute.
    AttributeCertificateRefs,
}

/// A pointer to a certificate the signature does not necessarily embed:
/// a digest over its encoding, issuer + serial claims, or both.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateRef {
    /// Digest over the referenced certificate's DER encoding.
    pub cert_digest: Option<Digest>,

    /// Claimed issuer + serial of the referenced certificate.
    pub issuer_info: Option<IssuerSerialInfo>,

    /// Where this reference was found.
    pub origin: CertificateRefOrigin,
}

impl CertificateRef {
    /// Builds a reference from its decoded attribute payload.
    ///
    /// An unsupported digest algorithm is an error; the caller logs it and
    /// excludes the reference rather than aborting collection.
    pub fn from_data(
        data: &CertificateRefData,
        origin: CertificateRefOrigin,
    ) -> Result<Self, DigestError> {
        let cert_digest = if data.digest_value.is_empty() {
            None
        } else {
            let algorithm = DigestAlgorithm::from_oid(&data.digest_algorithm_oid)?;
            Some(Digest::new(algorithm, data.digest_value.clone()))
        };

        Ok(Self {
            cert_digest,
            issuer_info: data.issuer_serial.clone(),
            origin,
        })
    }

    /// Returns `true` when this reference designates `token`.
    ///
    /// A digest claim is authoritative when present; issuer + serial claims
    /// are consulted only for digest-less references.
    pub fn matches(&self, token: &CertificateToken) -> bool {
        if let Some(digest) = &self.cert_digest {
            return token.matches_digest(digest);
        }

        if let Some(info) = &self.issuer_info {
            return token.issuer_name_der() == info.issuer_name.as_slice()
                && token.serial() == info.serial.as_slice();
        }

        false
    }
}
