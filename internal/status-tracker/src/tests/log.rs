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

use std::borrow::Cow;

use crate::{log_item, validation_codes, LogItem, StatusTracker};

#[test]
fn new() {
    let log_item = LogItem::new("test1", "test item 1", "test func", "src/test.rs", 42);

    assert_eq!(
        log_item,
        LogItem {
            label: Cow::Borrowed("test1"),
            description: Cow::Borrowed("test item 1"),
            file: Cow::Borrowed("src/test.rs"),
            function: Cow::Borrowed("test func"),
            line: 42u32,
            err_val: None,
            validation_status: None,
            signature_id: None,
        }
    );
}

#[test]
fn error() {
    let log_item = LogItem::new("test1", "test item 1", "test func", "src/test.rs", 42)
        .error("sample error message");

    assert_eq!(
        log_item.err_val,
        Some(Cow::Borrowed("\"sample error message\""))
    );
}

#[test]
fn macro_captures_location() {
    let log_item = log_item!("label", "description", "function");

    assert_eq!(log_item.label, Cow::Borrowed("label"));
    assert_eq!(log_item.file, Cow::Borrowed(file!()));
    assert!(log_item.line > 1);
}

#[test]
fn validation_status() {
    let log_item = log_item!("label", "description", "function")
        .validation_status(validation_codes::TIMESTAMP_MALFORMED);

    assert_eq!(
        log_item.validation_status,
        Some(Cow::Borrowed(validation_codes::TIMESTAMP_MALFORMED))
    );
}

#[test]
fn failure_no_throw_records_error() {
    let mut tracker = StatusTracker::default();

    log_item!("label", "description", "function")
        .failure_no_throw(&mut tracker, "went sideways");

    assert_eq!(tracker.logged_items().len(), 1);
    assert!(tracker.has_any_error());
}
