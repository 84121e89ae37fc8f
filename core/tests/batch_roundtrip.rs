/*
 * batch_roundtrip.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * End-to-end tests for batch handling. Each test drives handle_batch with a
 * recording dispatcher, then parses the assembled response back as a client
 * would.
 *
 * Run with:
 *   cargo test -p fascicolo_core --test batch_roundtrip
 */

use fascicolo_core::batch::{
    handle_batch, normalize_service_root, parse_batch_request, parse_batch_response,
    write_batch_request, BatchRequestBody, BatchRequestPart, BatchResponse, Dispatcher,
    ExecutionContext, Method, PathInfo, RequestDescriptor, ResponseDescriptor, CONTENT_TYPE,
    LOCATION,
};
use fascicolo_core::{BatchConfig, BatchError, DispatchError};
use rstest::rstest;

const ROOT: &str = "http://localhost:19000/odata/Employees.svc/";
const BATCH_CONTENT_TYPE: &str = "multipart/mixed; boundary=batch_1";

/// Dispatcher that records every request and answers like a tiny entity store.
///
/// GET echoes the dispatched URI, POST creates `Employees('7')`, other methods answer 204.
/// A path starting with an unresolved `$token` is not found; `fail_on` forces a 500.
struct RecordingDispatcher {
    calls: Vec<String>,
    fail_on: Option<String>,
}

impl RecordingDispatcher {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_on: None,
        }
    }

    fn failing_on(suffix: &str) -> Self {
        Self {
            calls: Vec::new(),
            fail_on: Some(suffix.to_string()),
        }
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(
        &mut self,
        request: &RequestDescriptor,
        _context: &ExecutionContext,
    ) -> Result<ResponseDescriptor, DispatchError> {
        let uri = request.request_uri();
        self.calls.push(format!("{} {}", request.method(), uri));
        if self.fail_on.as_deref().is_some_and(|suffix| uri.ends_with(suffix)) {
            return Ok(ResponseDescriptor::new(500).with_body("storage failure"));
        }
        if request.path_info().first_segment().is_some_and(|s| s.starts_with('$')) {
            return Ok(ResponseDescriptor::new(404));
        }
        Ok(match request.method() {
            Method::Get => ResponseDescriptor::new(200)
                .with_header(CONTENT_TYPE, "text/plain")
                .with_body(uri),
            Method::Post => ResponseDescriptor::new(201)
                .with_header(LOCATION, format!("{}/Employees('7')", normalize_service_root(ROOT))),
            _ => ResponseDescriptor::new(204),
        })
    }
}

fn context() -> ExecutionContext {
    ExecutionContext::new(BatchConfig::new().with_service_root(ROOT))
}

fn crlf(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("{}\r\n", l)).collect()
}

fn reparse(response: &BatchResponse) -> Vec<fascicolo_core::BatchResponsePart> {
    assert_eq!(response.status(), 202);
    let config = BatchConfig::new();
    parse_batch_response(response.body().clone(), response.content_type(), &config).unwrap()
}

fn send(request: &BatchRequestBody, dispatcher: &mut RecordingDispatcher) -> BatchResponse {
    let body = request.body().clone();
    handle_batch(body, request.content_type(), &context(), dispatcher).unwrap()
}

fn put(index: usize) -> RequestDescriptor {
    RequestDescriptor::new(
        Method::Put,
        PathInfo::relative([format!("Employees('{}')", index), "EmployeeName".to_string()]),
    )
    .with_header(CONTENT_TYPE, "application/json")
    .with_body(format!("{{\"EmployeeName\":\"Walter {}\"}}", index))
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
fn query_and_changeset_keep_their_grouping(#[case] members: usize) {
    let query = RequestDescriptor::new(
        Method::Get,
        PathInfo::relative(["Employees('1')", "EmployeeName"]),
    );
    let change_set = (1..=members).map(put).collect();
    let request = write_batch_request(&[
        BatchRequestPart::Query(query),
        BatchRequestPart::ChangeSet(change_set),
    ])
    .unwrap();

    let mut dispatcher = RecordingDispatcher::new();
    let response = send(&request, &mut dispatcher);
    assert_eq!(dispatcher.calls.len(), members + 1);

    let parts = reparse(&response);
    assert_eq!(parts.len(), 2);
    assert!(!parts[0].is_change_set());
    assert_eq!(parts[0].responses()[0].status(), 200);
    assert_eq!(
        parts[0].responses()[0].body_text(),
        "http://localhost:19000/odata/Employees.svc/Employees('1')/EmployeeName"
    );
    assert!(parts[1].is_change_set());
    assert_eq!(parts[1].responses().len(), members);
    assert!(parts[1].responses().iter().all(|r| r.status() == 204));
}

#[test]
fn failing_member_ends_changeset() {
    let query = RequestDescriptor::new(Method::Get, PathInfo::relative(["Employees"]));
    let request = write_batch_request(&[
        BatchRequestPart::ChangeSet(vec![put(1), put(2), put(3)]),
        BatchRequestPart::Query(query),
    ])
    .unwrap();

    let mut dispatcher = RecordingDispatcher::failing_on("Employees('2')/EmployeeName");
    let response = send(&request, &mut dispatcher);
    // third member skipped, later query still runs
    assert_eq!(dispatcher.calls.len(), 3);
    assert!(dispatcher.calls[2].starts_with("GET "));

    let parts = reparse(&response);
    assert_eq!(parts.len(), 2);
    assert!(!parts[0].is_change_set());
    assert_eq!(parts[0].responses().len(), 1);
    assert_eq!(parts[0].responses()[0].status(), 500);
    assert_eq!(parts[0].responses()[0].body_text(), "storage failure");
    assert_eq!(parts[1].responses()[0].status(), 200);
}

#[test]
fn content_id_resolves_only_after_creation() {
    let body = crlf(&[
        "--batch_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "GET $1/EmployeeName HTTP/1.1",
        "",
        "--batch_1",
        "Content-Type: multipart/mixed; boundary=cs_1",
        "",
        "--cs_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "Content-Id: 1",
        "",
        "POST Employees HTTP/1.1",
        "Content-Type: application/json",
        "Content-Length: 2",
        "",
        "{}",
        "--cs_1--",
        "--batch_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "GET $1/EmployeeName HTTP/1.1",
        "",
        "--batch_1--",
    ]);

    let mut dispatcher = RecordingDispatcher::new();
    let response = handle_batch(body, BATCH_CONTENT_TYPE, &context(), &mut dispatcher).unwrap();
    assert_eq!(
        dispatcher.calls,
        vec![
            "GET http://localhost:19000/odata/Employees.svc/$1/EmployeeName",
            "POST http://localhost:19000/odata/Employees.svc/Employees",
            "GET http://localhost:19000/odata/Employees.svc/Employees('7')/EmployeeName",
        ]
    );

    let parts = reparse(&response);
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].responses()[0].status(), 404);
    let created = &parts[1].responses()[0];
    assert_eq!(created.status(), 201);
    assert_eq!(created.mime_content_id(), Some("1"));
    assert_eq!(parts[2].responses()[0].status(), 200);
}

#[test]
fn application_content_id_takes_precedence() {
    let body = crlf(&[
        "--batch_1",
        "Content-Type: multipart/mixed; boundary=cs_1",
        "",
        "--cs_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "Content-Id: mime",
        "",
        "POST Employees HTTP/1.1",
        "Content-Id: app",
        "",
        "--cs_1--",
        "--batch_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "GET $app HTTP/1.1",
        "",
        "--batch_1--",
    ]);

    let mut dispatcher = RecordingDispatcher::new();
    let response = handle_batch(body, BATCH_CONTENT_TYPE, &context(), &mut dispatcher).unwrap();
    assert_eq!(
        dispatcher.calls[1],
        "GET http://localhost:19000/odata/Employees.svc/Employees('7')"
    );

    let parts = reparse(&response);
    let created = &parts[0].responses()[0];
    assert_eq!(created.mime_content_id(), Some("mime"));
    assert_eq!(created.response_content_id(), Some("app"));
    assert_eq!(created.content_id(), Some("app"));
}

#[test]
fn missing_blank_line_reports_line() {
    let body = crlf(&[
        "--batch_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "GET Employees('1') HTTP/1.1",
        "",
        "--batch_1--",
    ]);

    let mut dispatcher = RecordingDispatcher::new();
    let err = handle_batch(body, BATCH_CONTENT_TYPE, &context(), &mut dispatcher).unwrap_err();
    match &err {
        BatchError::MissingBlankLine { text, line } => {
            assert_eq!(*line, 4);
            assert_eq!(text, "GET Employees('1') HTTP/1.1");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(dispatcher.calls.is_empty());
    assert_eq!(BatchResponse::error(&err).status(), 400);
}

#[test]
fn unterminated_request_headers_fail_before_dispatch() {
    let body = crlf(&[
        "--batch_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "GET Employees HTTP/1.1",
        "Accept: application/json",
        "--batch_1--",
    ]);

    let mut dispatcher = RecordingDispatcher::new();
    let err = handle_batch(body, BATCH_CONTENT_TYPE, &context(), &mut dispatcher).unwrap_err();
    assert!(matches!(err, BatchError::MissingBlankLine { line: 6, .. }));
    assert!(dispatcher.calls.is_empty());
}

#[test]
fn short_body_is_truncated_body() {
    let payload = "y".repeat(30);
    let body = crlf(&[
        "--batch_1",
        "Content-Type: multipart/mixed; boundary=cs_1",
        "",
        "--cs_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "PUT Employees('1') HTTP/1.1",
        "Content-Type: application/json",
        "Content-Length: 50",
        "",
        payload.as_str(),
        "--cs_1--",
        "--batch_1--",
    ]);

    let mut dispatcher = RecordingDispatcher::new();
    let err = handle_batch(body, BATCH_CONTENT_TYPE, &context(), &mut dispatcher).unwrap_err();
    assert!(matches!(
        err,
        BatchError::TruncatedBody {
            declared: 50,
            actual: 30,
            line: 12
        }
    ));
    assert!(dispatcher.calls.is_empty());
}

#[test]
fn employee_name_scenario() {
    let body = crlf(&[
        "--batch_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "GET Employees('1')/EmployeeName HTTP/1.1",
        "Accept: application/json;q=0.9, */*",
        "",
        "--batch_1",
        "Content-Type: multipart/mixed; boundary=cs_1",
        "",
        "--cs_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "PUT Employees('1')/EmployeeName HTTP/1.1",
        "Content-Type: application/json",
        "",
        "{\"EmployeeName\":\"Walter Winter MODIFIED\"}",
        "--cs_1--",
        "--batch_1--",
    ]);

    let config = BatchConfig::new().with_service_root(ROOT);
    let parts = parse_batch_request(body.clone(), BATCH_CONTENT_TYPE, &config).unwrap();
    assert_eq!(parts.len(), 2);
    assert!(!parts[0].is_change_set());
    assert!(parts[1].is_change_set());
    assert_eq!(parts[1].requests().len(), 1);
    let member = &parts[1].requests()[0];
    assert_eq!(member.method(), Method::Put);
    assert_eq!(&member.body()[..], b"{\"EmployeeName\":\"Walter Winter MODIFIED\"}");

    let mut dispatcher = RecordingDispatcher::new();
    let response = handle_batch(body, BATCH_CONTENT_TYPE, &context(), &mut dispatcher).unwrap();
    assert!(response.content_type().starts_with("multipart/mixed; boundary=batch_"));
    let parts = reparse(&response);
    assert_eq!(parts.len(), 2);
    assert!(!parts[0].is_change_set());
    assert!(parts[1].is_change_set());
    assert_eq!(parts[1].responses().len(), 1);
}

#[test]
fn get_inside_changeset_fails_whole_batch() {
    let body = crlf(&[
        "--batch_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "GET Employees('1')/EmployeeName HTTP/1.1",
        "",
        "--batch_1",
        "Content-Type: multipart/mixed; boundary=cs_1",
        "",
        "--cs_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "GET Employees('2') HTTP/1.1",
        "",
        "--cs_1--",
        "--batch_1--",
    ]);

    let mut dispatcher = RecordingDispatcher::new();
    let err = handle_batch(body, BATCH_CONTENT_TYPE, &context(), &mut dispatcher).unwrap_err();
    match err {
        BatchError::InvalidChangesetMethod { method, line } => {
            assert_eq!(method, "GET");
            assert_eq!(line, 14);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(dispatcher.calls.is_empty());
}

#[test]
fn lenient_config_accepts_post_query_and_bare_parts() {
    let config = BatchConfig::from_xml(&format!(
        "<batch strict=\"false\"><service-root>{}</service-root></batch>",
        ROOT
    ))
    .unwrap();
    let body = crlf(&[
        "--batch_1",
        "Content-Type: application/http",
        "Content-Id: 4",
        "",
        "POST Employees HTTP/1.1",
        "",
        "--batch_1",
        "Content-Type: application/http",
        "",
        "GET $4/EmployeeName HTTP/1.1",
        "",
        "--batch_1--",
    ]);

    let mut dispatcher = RecordingDispatcher::new();
    let context = ExecutionContext::new(config);
    let response = handle_batch(body, BATCH_CONTENT_TYPE, &context, &mut dispatcher).unwrap();
    let parts = reparse(&response);
    assert_eq!(parts[0].responses()[0].status(), 201);
    assert_eq!(parts[0].responses()[0].mime_content_id(), Some("4"));
    assert_eq!(parts[1].responses()[0].status(), 200);
    assert_eq!(
        dispatcher.calls[1],
        "GET http://localhost:19000/odata/Employees.svc/Employees('7')/EmployeeName"
    );
}

#[test]
fn closure_dispatcher_sees_batch_headers() {
    let body = crlf(&[
        "--batch_1",
        "Content-Type: application/http",
        "Content-Transfer-Encoding: binary",
        "",
        "GET Employees HTTP/1.1",
        "",
        "--batch_1--",
    ]);
    let headers = [("Authorization".to_string(), "Basic d2FsdGVy".to_string())]
        .into_iter()
        .collect();
    let context = context().with_batch_headers(headers);
    let mut seen = Vec::new();
    let mut dispatcher = |request: &RequestDescriptor, context: &ExecutionContext| {
        seen.push(context.batch_headers().get("authorization").map(str::to_owned));
        let body = request.path_info().odata_path();
        Ok::<_, DispatchError>(ResponseDescriptor::new(200).with_body(body))
    };
    let response = handle_batch(body, BATCH_CONTENT_TYPE, &context, &mut dispatcher).unwrap();
    assert_eq!(seen, vec![Some("Basic d2FsdGVy".to_string())]);
    let parts = reparse(&response);
    assert_eq!(parts[0].responses()[0].body_text(), "Employees");
}
