// Copyright 2022 Adobe. All rights reserved.
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

use std::{borrow::Cow, fmt::Debug};

use serde::Serialize;

use crate::StatusTracker;

/// Detailed information about an error or other noteworthy condition found
/// while validating a signature.
///
/// Use the [`log_item`](crate::log_item) macro to create a `LogItem`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LogItem {
    /// Identifier for the signature element this item references (an
    /// attribute OID, a token identifier, or other descriptive label).
    pub label: Cow<'static, str>,

    /// Description of the condition.
    pub description: Cow<'static, str>,

    /// Source file where the condition was detected.
    pub file: Cow<'static, str>,

    /// Function where the condition was detected.
    pub function: Cow<'static, str>,

    /// Source line number where the condition was detected.
    pub line: u32,

    /// Error value, as a string.
    pub err_val: Option<Cow<'static, str>>,

    /// AdES validation status code (see [`validation_codes`]).
    ///
    /// [`validation_codes`]: crate::validation_codes
    pub validation_status: Option<Cow<'static, str>>,

    /// Identifier of the signature being validated when this item was
    /// logged, if known.
    pub signature_id: Option<Cow<'static, str>>,
}

impl LogItem {
    /// Creates a [`LogItem`] without using the [`log_item`] macro.
    ///
    /// Intended primarily for testing.
    ///
    /// [`log_item`]: crate::log_item
    pub fn new(
        label: &'static str,
        description: &'static str,
        function: &'static str,
        file: &'static str,
        line: u32,
    ) -> Self {
        LogItem {
            label: label.into(),
            description: description.into(),
            function: function.into(),
            file: file.into(),
            line,
            err_val: None,
            validation_status: None,
            signature_id: None,
        }
    }

    /// Records this item as a success in the [`StatusTracker`].
    pub fn success(self, tracker: &mut StatusTracker) {
        tracker.add_non_error(self);
    }

    /// Records this item as an informational message in the
    /// [`StatusTracker`].
    pub fn informational(self, tracker: &mut StatusTracker) {
        tracker.add_non_error(self);
    }

    /// Records this item as a failure in the [`StatusTracker`].
    ///
    /// If the tracker is configured to stop on the first error, this returns
    /// `Err(err)`; otherwise the item is recorded and validation continues.
    pub fn failure<E: Debug>(self, tracker: &mut StatusTracker, err: E) -> Result<(), E> {
        let item = self.error(&err);
        tracker.add_error(item, err)
    }

    /// Records this item as a failure in the [`StatusTracker`] without
    /// interrupting the caller regardless of the tracker's error behavior.
    ///
    /// This is the entry point for the "log, skip, continue" handling of
    /// malformed sub-elements.
    pub fn failure_no_throw<E: Debug>(self, tracker: &mut StatusTracker, err: E) {
        tracker.add_non_error(self.error(err));
    }

    /// Captures the description of an error value as additional information
    /// for this `LogItem`.
    ///
    /// This is implemented using the [`Debug`] trait, which the `Error` enum
    /// from any crate is likely to fulfill.
    pub fn error<E: Debug>(self, err: E) -> Self {
        LogItem {
            err_val: Some(format!("{err:?}").into()),
            ..self
        }
    }

    /// Adds an AdES validation status code.
    pub fn validation_status(self, status: &'static str) -> Self {
        LogItem {
            validation_status: Some(status.into()),
            ..self
        }
    }
}

/// Creates a [`LogItem`] struct that is annotated with the source file and
/// line number where the log condition was discovered.
///
/// Takes three parameters, each of which may be a `'static str` or `String`:
///
/// * `label`: identifier of the signature element this item references
/// * `description`: human-readable reason for this `LogItem` to have been
///   generated
/// * `function`: name of the function generating this `LogItem`
///
/// ## Example
///
/// ```
/// # use ades_status_tracker::{log_item, LogItem};
/// let log = log_item!("1.2.840.113549.1.9.5", "signing time rejected", "signing_time");
/// ```
#[macro_export]
macro_rules! log_item {
    ($label:expr, $description:expr, $function:expr) => {{
        $crate::LogItem {
            label: $label.into(),
            file: file!().into(),
            function: $function.into(),
            line: line!(),
            description: $description.into(),
            err_val: None,
            validation_status: None,
            signature_id: None,
        }
    }};
}
