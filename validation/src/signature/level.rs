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

use std::fmt;

use super::SignatureForm;

/// ETSI signature maturity tiers: the baseline profiles B/T/LT/LTA plus
/// the legacy C/X/X-L/A chain. Each level adds evidence over the previous
/// one; satisfaction of a level requires satisfaction of every level below
/// it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SignatureLevel {
    /// The signature does not satisfy the base profile.
    NotEtsi,

    /// Basic: a signed signing-certificate reference is present.
    BaselineB,

    /// B plus a signature timestamp.
    BaselineT,

    /// Legacy: T plus complete certificate and revocation references.
    C,

    /// Legacy: C plus a timestamp over the references (escape or
    /// certs-and-CRLs).
    X,

    /// Legacy: X plus embedded certificate and revocation values.
    Xl,

    /// Legacy: X-L plus an archive timestamp.
    A,

    /// Long-term: T plus either an archive timestamp or complete
    /// certificate and revocation references.
    BaselineLt,

    /// Long-term-with-archive: LT plus an archive timestamp.
    BaselineLta,
}

impl SignatureLevel {
    /// Returns `true` when this level exists for signatures of `form`.
    ///
    /// The legacy C/X/X-L/A chain has no PDF rendition; requesting one of
    /// those levels on a PAdES signature is caller misuse.
    pub fn applicable_to(&self, form: SignatureForm) -> bool {
        match self {
            Self::NotEtsi
            | Self::BaselineB
            | Self::BaselineT
            | Self::BaselineLt
            | Self::BaselineLta => true,

            Self::C | Self::X | Self::Xl | Self::A => {
                matches!(form, SignatureForm::Cades | SignatureForm::Xades)
            }
        }
    }
}

impl fmt::Display for SignatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEtsi => write!(f, "NOT-ETSI"),
            Self::BaselineB => write!(f, "BASELINE-B"),
            Self::BaselineT => write!(f, "BASELINE-T"),
            Self::C => write!(f, "C"),
            Self::X => write!(f, "X"),
            Self::Xl => write!(f, "X-L"),
            Self::A => write!(f, "A"),
            Self::BaselineLt => write!(f, "BASELINE-LT"),
            Self::BaselineLta => write!(f, "BASELINE-LTA"),
        }
    }
}
