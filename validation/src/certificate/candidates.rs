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

use std::sync::Arc;

use super::CertificateToken;

/// One certificate that might be the signer, with the outcome of every
/// check performed against it.
#[derive(Clone, Debug)]
pub struct CertificateValidity {
    token: Arc<CertificateToken>,

    /// The signer identifier in the signature designates this certificate.
    pub signer_id_match: bool,

    /// A signed signing-certificate reference is present.
    pub attribute_present: bool,

    /// The first signing-certificate reference carries a digest.
    pub digest_present: bool,

    /// That digest matches this certificate.
    pub digest_equal: bool,

    /// The reference carries issuer + serial claims.
    pub issuer_serial_present: bool,

    /// The claimed serial matches this certificate.
    pub serial_equal: bool,

    /// The claimed issuer name matches this certificate.
    pub issuer_equal: bool,
}

impl CertificateValidity {
    /// Creates a validity record for `token` with no checks performed yet.
    pub fn new(token: Arc<CertificateToken>) -> Self {
        Self {
            token,
            signer_id_match: false,
            attribute_present: false,
            digest_present: false,
            digest_equal: false,
            issuer_serial_present: false,
            serial_equal: false,
            issuer_equal: false,
        }
    }

    /// Returns the candidate certificate.
    pub fn token(&self) -> &Arc<CertificateToken> {
        &self.token
    }

    /// Returns `true` when the evidence ties this certificate to the
    /// signature: a matching reference digest, matching issuer + serial
    /// claims, or a signer identifier match.
    pub fn is_valid(&self) -> bool {
        self.digest_equal || (self.serial_equal && self.issuer_equal) || self.signer_id_match
    }
}

/// The set of signing-certificate candidates resolved for a signature,
/// with at most one of them elected as the best match.
#[derive(Clone, Debug, Default)]
pub struct CandidatesForSigningCertificate {
    candidates: Vec<CertificateValidity>,
    best_index: Option<usize>,
}

impl CandidatesForSigningCertificate {
    /// Creates an empty candidate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate, returning its index.
    pub fn add(&mut self, validity: CertificateValidity) -> usize {
        self.candidates.push(validity);
        self.candidates.len() - 1
    }

    /// Returns every candidate in discovery order.
    pub fn candidates(&self) -> &[CertificateValidity] {
        &self.candidates
    }

    /// Returns a mutable view of the candidate at `index`, if any.
    pub fn candidate_mut(&mut self, index: usize) -> Option<&mut CertificateValidity> {
        self.candidates.get_mut(index)
    }

    /// Elects the candidate at `index` as the best match.
    pub fn set_best(&mut self, index: usize) {
        if index < self.candidates.len() {
            self.best_index = Some(index);
        }
    }

    /// Returns the index of the elected best candidate, if any.
    pub fn best_index(&self) -> Option<usize> {
        self.best_index
    }

    /// Returns the elected best candidate, if any.
    pub fn best_candidate(&self) -> Option<&CertificateValidity> {
        self.best_index.and_then(|i| self.candidates.get(i))
    }

    /// Returns the elected best candidate's certificate, if any.
    pub fn best_token(&self) -> Option<Arc<CertificateToken>> {
        self.best_candidate().map(|v| v.token().clone())
    }

    /// Returns `true` if no candidate was discovered.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
