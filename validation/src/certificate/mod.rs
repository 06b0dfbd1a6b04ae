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

//! Certificate tokens, the shared certificate pool, and the per-signature
//! certificate source.

mod candidates;
mod pool;
mod refs;
mod source;
mod token;

pub use candidates::{CandidatesForSigningCertificate, CertificateValidity};
pub use pool::CertificatePool;
pub use refs::{CertificateRef, CertificateRefOrigin};
pub use source::{
    certificate_ref_by_digest, certificate_refs_map, find_tokens_from_refs,
    references_for_certificate_token, CertificateRefsMap, EmbeddedCertificateSource,
    SignatureCertificateSource,
};
pub use token::{CertificateError, CertificateToken};
