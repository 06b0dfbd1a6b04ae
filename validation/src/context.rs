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

//! The per-validation context holding the state shared across signatures.

use crate::{certificate::CertificatePool, policy::SignaturePolicyStore};

/// State shared by every signature validated from one container: the
/// certificate pool and the signature-policy cache.
///
/// Explicitly constructed and dropped by the caller; nothing here is
/// process-global. Clone an `Arc<ValidationContext>` into each signature
/// to share it.
#[derive(Debug, Default)]
pub struct ValidationContext {
    /// Deduplicating certificate interner.
    pub pool: CertificatePool,

    /// Shared policy-document cache, keyed by policy identifier.
    pub policy_store: SignaturePolicyStore,
}

impl ValidationContext {
    /// Creates a fresh context with an empty pool and policy cache.
    pub fn new() -> Self {
        Self::default()
    }
}
