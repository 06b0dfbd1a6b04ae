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

//! Offline revocation evidence (CRLs and OCSP responses) embedded in a
//! signature, classified by where each object or reference was found.

pub mod crl;
pub mod ocsp;

use std::fmt;

/// Where a revocation object (a CRL or OCSP response) was embedded.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RevocationOrigin {
    /// The unsigned revocation-values attribute.
    RevocationValues,

    /// The unsigned attribute-revocation-values element.
    AttributeRevocationValues,

    /// Sealed inside one of the signature's own timestamp tokens.
    TimestampRevocationValues,

    /// A PDF DSS dictionary.
    DssDictionary,

    /// A PDF VRI dictionary.
    VriDictionary,
}

impl fmt::Display for RevocationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RevocationValues => write!(f, "revocation-values"),
            Self::AttributeRevocationValues => write!(f, "attribute-revocation-values"),
            Self::TimestampRevocationValues => write!(f, "timestamp-revocation-values"),
            Self::DssDictionary => write!(f, "dss-dictionary"),
            Self::VriDictionary => write!(f, "vri-dictionary"),
        }
    }
}

/// Where a revocation reference (a digest-based pointer) was declared.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RevocationRefLocation {
    /// The unsigned complete-revocation-references attribute.
    CompleteRevocationRefs,

    /// The unsigned attribute-revocation-references attribute.
    AttributeRevocationRefs,

    /// Declared inside one of the signature's own timestamp tokens.
    TimestampRevocationRefs,
}

impl fmt::Display for RevocationRefLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompleteRevocationRefs => write!(f, "complete-revocation-refs"),
            Self::AttributeRevocationRefs => write!(f, "attribute-revocation-refs"),
            Self::TimestampRevocationRefs => write!(f, "timestamp-revocation-refs"),
        }
    }
}
