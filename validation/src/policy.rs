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

//! Signature policies: the resolved policy attached to a signature, the
//! collaborator that fetches policy documents, and the shared
//! by-identifier cache.

use std::{collections::HashMap, sync::Mutex};

use crate::digest::Digest;

/// The signature policy a signature declares, resolved as far as the
/// available evidence allows.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignaturePolicy {
    /// Policy identifier in dotted-decimal form. `None` for an implied
    /// policy.
    pub identifier: Option<String>,

    /// Digest the signature claims over the policy document.
    pub digest: Option<Digest>,

    /// URL where the policy document can be obtained, if declared.
    pub url: Option<String>,

    /// User notice to display when validating, if declared.
    pub notice: Option<String>,

    /// The policy document bytes, when the provider (or the shared cache)
    /// could supply them.
    pub content: Option<Vec<u8>>,
}

impl SignaturePolicy {
    /// Returns `true` when the claimed digest matches the fetched policy
    /// document. `None` when either side is missing.
    pub fn digest_matches(&self) -> Option<bool> {
        let digest = self.digest.as_ref()?;
        let content = self.content.as_ref()?;
        Some(digest.algorithm.digest(content) == digest.value)
    }
}

/// Collaborator that fetches signature policy documents.
///
/// Implementations may hit the network or a local store; returning `None`
/// simply leaves the policy unresolved.
pub trait SignaturePolicyProvider {
    /// Returns the policy document for a policy identifier.
    fn policy_by_id(&self, id: &str) -> Option<Vec<u8>>;

    /// Returns the policy document from a URL qualifier.
    fn policy_by_url(&self, url: &str) -> Option<Vec<u8>>;
}

/// Cache of fetched policy documents, keyed by policy identifier and
/// shared across every signature validated within one context.
#[derive(Debug, Default)]
pub struct SignaturePolicyStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl SignaturePolicyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached document for `id`, if any.
    pub fn get(&self, id: &str) -> Option<Vec<u8>> {
        self.entries.lock().ok()?.get(id).cloned()
    }

    /// Caches a fetched document under `id`.
    pub fn put(&self, id: &str, content: Vec<u8>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(id.to_owned(), content);
        }
    }
}
