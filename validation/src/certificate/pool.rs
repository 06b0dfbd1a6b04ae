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

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{CertificateError, CertificateToken};

/// Deduplicating interner for certificate tokens.
///
/// The pool is keyed by DER encoding: requesting the same bytes twice
/// returns the same `Arc`, so every source that sees a given certificate
/// shares one token instance. Find-or-insert is atomic; the pool may be
/// shared across signatures validated concurrently.
#[derive(Debug, Default)]
pub struct CertificatePool {
    entries: Mutex<HashMap<Vec<u8>, Arc<CertificateToken>>>,
}

impl CertificatePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pooled token for `der`, parsing and inserting it if this
    /// encoding has not been seen before.
    pub fn get_instance(&self, der: &[u8]) -> Result<Arc<CertificateToken>, CertificateError> {
        let mut entries = self.entries.lock().map_err(|_| CertificateError::PoolLock)?;

        if let Some(token) = entries.get(der) {
            return Ok(token.clone());
        }

        let token = Arc::new(CertificateToken::from_der(der)?);
        entries.insert(der.to_vec(), token.clone());
        Ok(token)
    }

    /// Returns the number of distinct certificates in the pool.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Returns `true` if the pool holds no certificates.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
