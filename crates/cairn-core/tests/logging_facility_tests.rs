#![allow(clippy::unwrap_used, clippy::expect_used)]

use cairn_core::errors::CairnError;
use cairn_core::logging_facility::test_capture::init_test_capture;
use cairn_core::progress::NoopProgress;
use cairn_core::{log_op_end, log_op_error, log_op_start, ManifestBuilder};
use cairn_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_DURATION_MS, FIELD_ERR_CODE, FIELD_ERR_KIND,
};
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, path = "/a.txt");

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("path"), Some("/a.txt"));
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field(FIELD_DURATION_MS), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = CairnError::NotADirectory {
        path: PathBuf::from("/nowhere"),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field(FIELD_ERR_CODE), Some("ERR_INVALID_INPUT"));
    assert_eq!(events[0].field(FIELD_ERR_KIND), Some("InvalidInput"));
}

#[test]
fn test_manifest_build_logs_boundaries() {
    let capture = init_test_capture();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("x.bin"), b"x").unwrap();

    ManifestBuilder::new(dir.path())
        .build(&mut NoopProgress)
        .unwrap();

    capture.assert_event_exists("manifest_build", EVENT_START);
    capture.assert_event_exists("manifest_build", EVENT_END);
}
