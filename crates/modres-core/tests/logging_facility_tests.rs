#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{root, Fixture};
use modres_core::errors::ResolveError;
use modres_core::logging_facility::test_capture::init_test_capture;
use modres_core::{log_op_end, log_op_error, log_op_start};
use modres_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, EVENT_VALUES_MISSING, FIELD_CANONICAL_NAME,
    FIELD_DURATION_MS, FIELD_ERR_CODE, FIELD_ERR_KIND, FIELD_MODULE, FIELD_QUERY, FIELD_REQUEST_ID,
};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    let events = capture.events();
    let start_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START))
        .collect();

    assert!(
        !start_events.is_empty(),
        "Should have captured at least one start event"
    );
    assert!(start_events[0]
        .component
        .as_deref()
        .unwrap()
        .starts_with("logging_facility_tests"));
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events();
    let end_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field(FIELD_DURATION_MS), Some("42"));
}

#[test]
fn test_log_op_error_includes_code_and_module() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = ResolveError::DuplicateOverride {
        module: "ccc".to_string(),
    };
    log_op_error!(op_name, &err, duration_ms = 10);

    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");

    assert_eq!(error_event.field(FIELD_ERR_CODE), Some("ERR_DUPLICATE_OVERRIDE"));
    assert_eq!(error_event.field(FIELD_ERR_KIND), Some("DuplicateOverride"));
    assert_eq!(error_event.field(FIELD_MODULE), Some("ccc"));
    assert_eq!(error_event.level, tracing::Level::ERROR);
}

#[test]
fn test_log_macros_with_multiple_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_macros_fields_unique_4";

    log_op_start!(op_name, module = "bbb", canonical_name = "bbb~1.0");

    let events = capture.events();
    let start_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name))
        .expect("Should have start event");

    assert_eq!(start_event.field(FIELD_MODULE), Some("bbb"));
    assert_eq!(start_event.field(FIELD_CANONICAL_NAME), Some("bbb~1.0"));
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_test_capture_assert_event_exists_fails() {
    let capture = init_test_capture();

    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}

#[test]
fn test_repo_spec_query_logs_boundaries() {
    let capture = init_test_capture();
    let fixture = Fixture::new();
    fixture.add("logq", "1.0", &[]);
    let resolver = fixture.resolver(&root(&[("logq", "1.0")], ""));

    resolver.get_repo_spec("logq~1.0").unwrap();

    let for_query = |event: &str| {
        capture.count_events(|e| {
            e.op.as_deref() == Some("repo_spec")
                && e.event.as_deref() == Some(event)
                && e.field(FIELD_CANONICAL_NAME) == Some("logq~1.0")
        })
    };
    assert_eq!(for_query(EVENT_START), 1);
    assert_eq!(for_query(EVENT_END), 1);
    assert_eq!(for_query(EVENT_END_ERROR), 0);
}

#[test]
fn test_restarts_are_logged_with_request_id() {
    let capture = init_test_capture();
    let fixture = Fixture::new();
    fixture
        .add("logr", "1.0", &[("logs", "1.0")])
        .add("logs", "1.0", &[]);
    let resolver = fixture.resolver(&root(&[("logr", "1.0")], ""));

    resolver.get_repo_spec("logs~1.0").unwrap();

    let rounds: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| {
            e.event.as_deref() == Some(EVENT_VALUES_MISSING) && e.field(FIELD_QUERY) == Some("logs~1.0")
        })
        .collect();
    // logr, then logs, then the repo rule
    assert_eq!(rounds.len(), 3);
    let request_id = rounds[0].field(FIELD_REQUEST_ID).unwrap();
    assert!(rounds.iter().all(|e| e.field(FIELD_REQUEST_ID) == Some(request_id)));
}

#[test]
fn test_failed_query_logs_error_event() {
    let capture = init_test_capture();
    let fixture = Fixture::new();
    fixture.add("logt", "1.0", &[("logmissing", "1.0")]);
    let resolver = fixture.resolver(&root(&[("logt", "1.0")], ""));

    assert!(resolver.get_repo_spec("logmissing~1.0").is_err());

    let error_event = capture
        .events()
        .into_iter()
        .find(|e| {
            e.op.as_deref() == Some("repo_spec")
                && e.event.as_deref() == Some(EVENT_END_ERROR)
                && e.field(FIELD_CANONICAL_NAME) == Some("logmissing~1.0")
        })
        .expect("Should have error event for this query");
    assert_eq!(error_event.field(FIELD_ERR_CODE), Some("ERR_REGISTRY_LOOKUP"));
    assert_eq!(error_event.field(FIELD_MODULE), Some("logmissing"));

    let start_event = capture
        .events()
        .into_iter()
        .find(|e| {
            e.op.as_deref() == Some("repo_spec")
                && e.event.as_deref() == Some(EVENT_START)
                && e.field(FIELD_CANONICAL_NAME) == Some("logmissing~1.0")
        })
        .expect("Should have start event for this query");
    assert!(error_event.field(FIELD_REQUEST_ID).is_some());
    assert_eq!(error_event.field(FIELD_REQUEST_ID), start_event.field(FIELD_REQUEST_ID));
}

#[test]
fn test_query_boundaries_carry_the_evaluation_request_id() {
    let capture = init_test_capture();
    let fixture = Fixture::new();
    fixture.add("logu", "1.0", &[]);
    let resolver = fixture.resolver(&root(&[("logu", "1.0")], ""));

    resolver.get_repo_spec("logu~1.0").unwrap();

    let events = capture.events();
    let boundary = |event: &str| {
        events
            .iter()
            .find(|e| {
                e.op.as_deref() == Some("repo_spec")
                    && e.event.as_deref() == Some(event)
                    && e.field(FIELD_CANONICAL_NAME) == Some("logu~1.0")
            })
            .and_then(|e| e.field(FIELD_REQUEST_ID))
            .expect("boundary event should carry a request_id")
    };
    let round = events
        .iter()
        .find(|e| {
            e.event.as_deref() == Some(EVENT_VALUES_MISSING) && e.field(FIELD_QUERY) == Some("logu~1.0")
        })
        .and_then(|e| e.field(FIELD_REQUEST_ID))
        .expect("restart should carry a request_id");

    assert_eq!(boundary(EVENT_START), round);
    assert_eq!(boundary(EVENT_END), round);
}

#[test]
fn test_failed_resolve_reports_op_and_request_id() {
    let capture = init_test_capture();
    let fixture = Fixture::new();
    fixture.add("logv", "1.0", &[("logvmissing", "1.0")]);
    let resolver = fixture.resolver(&root(&[("logv", "1.0")], ""));

    assert!(resolver.resolve().is_err());

    let error_event = capture
        .events()
        .into_iter()
        .find(|e| {
            e.op.as_deref() == Some("resolve")
                && e.event.as_deref() == Some(EVENT_END_ERROR)
                && e.field(FIELD_MODULE) == Some("logvmissing")
        })
        .expect("Should have error event for this resolution");
    assert!(error_event.field(FIELD_REQUEST_ID).is_some());
    assert_eq!(error_event.field(FIELD_CANONICAL_NAME), None);
}
