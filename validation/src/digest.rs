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

//! Digest algorithms and the digest-based descriptors used to link a
//! reference to a token without holding the token itself.

use std::fmt;

use bcder::{ConstOid, Oid};
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest as _, Sha256, Sha384, Sha512};
use thiserror::Error;

/// SHA-1 (1.3.14.3.2.26)
pub const SHA1_OID: ConstOid = Oid(&[43, 14, 3, 2, 26]);

/// SHA-256 (2.16.840.1.101.3.4.2.1)
pub const SHA256_OID: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 1]);

/// SHA-384 (2.16.840.1.101.3.4.2.2)
pub const SHA384_OID: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 2]);

/// SHA-512 (2.16.840.1.101.3.4.2.3)
pub const SHA512_OID: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 3]);

/// A digest algorithm supported for reference matching.
///
/// An OID outside this set is reported as
/// [`DigestError::UnsupportedAlgorithm`]; callers log the condition and
/// exclude the affected item from matching rather than aborting validation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum DigestAlgorithm {
    /// SHA-1
    Sha1,

    /// SHA-256
    Sha256,

    /// SHA-384
    Sha384,

    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// Translates a DER-encoded OID (content octets) into a
    /// `DigestAlgorithm`.
    pub fn from_oid(oid: &[u8]) -> Result<Self, DigestError> {
        if oid == SHA1_OID.0 {
            Ok(Self::Sha1)
        } else if oid == SHA256_OID.0 {
            Ok(Self::Sha256)
        } else if oid == SHA384_OID.0 {
            Ok(Self::Sha384)
        } else if oid == SHA512_OID.0 {
            Ok(Self::Sha512)
        } else {
            Err(DigestError::UnsupportedAlgorithm(hex::encode(oid)))
        }
    }

    /// Returns the OID content octets for this algorithm.
    pub fn oid(&self) -> &'static [u8] {
        match self {
            Self::Sha1 => SHA1_OID.0,
            Self::Sha256 => SHA256_OID.0,
            Self::Sha384 => SHA384_OID.0,
            Self::Sha512 => SHA512_OID.0,
        }
    }

    /// Computes the digest of `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha384 => write!(f, "SHA384"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

/// An algorithm + value pair identifying some object by its hash.
///
/// Equality is algorithm + value equality.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct Digest {
    /// The digest algorithm.
    pub algorithm: DigestAlgorithm,

    /// The digest value.
    pub value: Vec<u8>,
}

impl Digest {
    /// Creates a `Digest` from an algorithm and value.
    pub fn new(algorithm: DigestAlgorithm, value: Vec<u8>) -> Self {
        Self { algorithm, value }
    }

    /// Computes the digest of `data` with `algorithm`.
    pub fn compute(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        Self {
            value: algorithm.digest(data),
            algorithm,
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, hex::encode(&self.value))
    }
}

/// Issuer name + serial number, identifying a certificate without holding
/// it.
///
/// The issuer name is kept as its DER encoding; two names are equal when
/// their encodings are byte-equal.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct IssuerSerialInfo {
    /// DER-encoded issuer `Name`.
    pub issuer_name: Vec<u8>,

    /// Certificate serial number, big-endian bytes.
    pub serial: Vec<u8>,
}

/// Describes errors arising from digest algorithm translation.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum DigestError {
    /// The digest algorithm OID is not supported.
    #[error("unsupported digest algorithm OID {0}")]
    UnsupportedAlgorithm(String),
}
