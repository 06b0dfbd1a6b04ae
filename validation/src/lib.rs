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

//! Validation data model for AdES signatures (CAdES, XAdES, PAdES).
//!
//! Given a parsed signed structure, this crate reconstructs the chain of
//! trust evidence the signature carries (certificates, revocation data,
//! timestamps), checks cryptographic integrity through an injected
//! signature validator, and reports which ETSI baseline-profile levels
//! (B/T/LT/LTA and the legacy C/X/A tiers) the embedded evidence satisfies.
//!
//! Low-level CMS/PDF/XML parsing and the raw cryptographic primitives are
//! collaborators supplied by the caller, not part of this crate.

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![deny(warnings)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]

pub mod certificate;
pub mod cms;
pub mod context;
pub mod digest;
pub mod policy;
pub mod raw_signature;
pub mod revocation;
pub mod signature;
pub mod time_stamp;

#[cfg(test)]
pub(crate) mod tests;
