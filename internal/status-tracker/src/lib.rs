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

//! Collects status messages (errors and informational messages) as they are
//! generated during the validation of an AdES signature.
//!
//! Malformed sub-elements of a signature are skipped, not fatal; the
//! [`StatusTracker`] is the structured record of every such degradation so
//! that a caller (or a test) can distinguish "valid" from
//! "valid-but-incomplete."

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![deny(warnings)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]

mod log;
pub use log::LogItem;

mod status_tracker;
pub use status_tracker::{ErrorBehavior, StatusTracker};

pub mod validation_codes;

#[cfg(test)]
pub(crate) mod tests;
