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

//! The cryptographic-verification collaborator.

use thiserror::Error;

/// An implementation of `RawSignatureValidator` checks a raw signature
/// value over a byte slice against a public key.
///
/// The cryptographic primitives are not part of this crate; the caller
/// supplies a validator backed by whatever cryptography library it uses.
pub trait RawSignatureValidator {
    /// Returns `Ok(())` if `sig` is a valid signature over `data` from the
    /// public key described by the DER-encoded `SubjectPublicKeyInfo` in
    /// `public_key_der`.
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key_der: &[u8],
    ) -> Result<(), RawSignatureValidationError>;
}

/// Describes errors that can be identified when validating a raw
/// signature.
#[derive(Debug, Error)]
pub enum RawSignatureValidationError {
    /// The signature does not match the provided data or public key.
    #[error("signature does not match the provided data or public key")]
    SignatureMismatch,

    /// The signature algorithm is not supported by the validator.
    #[error("unsupported signature algorithm ({0})")]
    UnsupportedAlgorithm(String),

    /// The public key could not be interpreted.
    #[error("invalid public key ({0})")]
    InvalidPublicKey(String),

    /// An error was reported by the underlying cryptography library.
    #[error("an error was reported by the underlying cryptography library ({0})")]
    CryptoLibraryError(String),
}
