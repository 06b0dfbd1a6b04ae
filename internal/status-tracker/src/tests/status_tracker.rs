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

use std::fmt::{self, Display, Formatter};

use crate::{log_item, validation_codes, ErrorBehavior, StatusTracker};

#[derive(Debug)]
struct SampleError {}

impl Display for SampleError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "SampleError")
    }
}

#[test]
fn aggregates_errors_when_continuing() {
    let mut tracker = StatusTracker::default();

    log_item!("test1", "test item 1", "test func").success(&mut tracker);

    log_item!("test2", "test item 2", "test func")
        .failure(&mut tracker, SampleError {})
        .expect("ContinueWhenPossible never propagates");

    assert_eq!(tracker.logged_items().len(), 2);
    assert_eq!(tracker.filter_errors().count(), 1);
}

#[test]
fn stops_on_first_error() {
    let mut tracker = StatusTracker::with_error_behavior(ErrorBehavior::StopOnFirstError);

    let result = log_item!("test1", "test item 1", "test func").failure(&mut tracker, SampleError {});

    assert!(result.is_err());
    assert_eq!(tracker.logged_items().len(), 1);
}

#[test]
fn has_status() {
    let mut tracker = StatusTracker::default();

    log_item!("test1", "test item 1", "test func")
        .validation_status(validation_codes::DETACHED_CONTENT_MISSING)
        .failure_no_throw(&mut tracker, SampleError {});

    assert!(tracker.has_status(validation_codes::DETACHED_CONTENT_MISSING));
    assert!(!tracker.has_status(validation_codes::SIGNATURE_NOT_INTACT));
}

#[test]
fn append_preserves_items() {
    let mut outer = StatusTracker::default();
    let mut inner = StatusTracker::default();

    log_item!("inner", "inner item", "test func").success(&mut inner);
    log_item!("outer", "outer item", "test func").success(&mut outer);

    outer.append(&inner);
    assert_eq!(outer.logged_items().len(), 2);
}

#[test]
fn signature_id_stamped_on_items() {
    let mut tracker = StatusTracker::default();
    tracker.push_signature_id("sig-1");

    log_item!("test1", "test item 1", "test func").success(&mut tracker);

    tracker.pop_signature_id();
    log_item!("test2", "test item 2", "test func").success(&mut tracker);

    assert_eq!(
        tracker.logged_items()[0].signature_id.as_deref(),
        Some("sig-1")
    );
    assert!(tracker.logged_items()[1].signature_id.is_none());
}
