//! Integration tests for the submit/poll protocol against a mock server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pdf4me_core::{
    AuthScheme, CancelSignal, ClientConfig, CoreError, DocumentInput, Operation,
    OperationRequest, Pdf4meClient, PollOptions, PollStrategy, ProgressEvent, Submission,
    encode_base64,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const API_KEY: &str = "test-key";

/// Answers with each template in turn, repeating the last one
struct Sequence {
    responses: Vec<ResponseTemplate>,
    calls: AtomicUsize,
}

impl Sequence {
    fn new(responses: Vec<ResponseTemplate>) -> Self {
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = n.min(self.responses.len() - 1);
        self.responses[index].clone()
    }
}

fn config(server: &MockServer, max_attempts: u32) -> ClientConfig {
    ClientConfig::new(Url::parse(&server.uri()).unwrap(), API_KEY)
        .with_poll_strategy(PollStrategy::fixed(Duration::from_millis(10), max_attempts))
}

fn client(server: &MockServer, max_attempts: u32) -> Pdf4meClient {
    Pdf4meClient::new(config(server, max_attempts)).unwrap()
}

fn accepted(server: &MockServer) -> ResponseTemplate {
    ResponseTemplate::new(202).insert_header("Location", format!("{}/status/1", server.uri()))
}

async fn get_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "GET")
        .count()
}

#[tokio::test]
async fn test_immediate_success_never_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/Optimize"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"PDFDATA".to_vec())
                .insert_header("Content-Type", "application/pdf"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let artifact = client(&server, 10)
        .execute("api/v2/Optimize", &json!({ "async": true }))
        .await
        .unwrap();

    assert_eq!(artifact.bytes(), b"PDFDATA");
    assert_eq!(artifact.content_type(), Some("application/pdf"));
    assert_eq!(get_count(&server).await, 0);
}

#[tokio::test]
async fn test_accepted_without_location_fails_without_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let err = client(&server, 10)
        .execute("api/v2/SplitPdf", &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::MissingLocationHeader));
    assert_eq!(get_count(&server).await, 0);
}

#[tokio::test]
async fn test_accepted_then_done_after_two_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/1"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(202),
            ResponseTemplate::new(200).set_body_bytes(b"DONE".to_vec()),
        ]))
        .expect(2)
        .mount(&server)
        .await;

    let artifact = client(&server, 10)
        .execute("api/v2/Merge", &json!({}))
        .await
        .unwrap();

    assert_eq!(artifact.bytes(), b"DONE");
    assert_eq!(get_count(&server).await, 2);
}

#[tokio::test]
async fn test_success_on_last_allowed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;

    let mut responses = vec![ResponseTemplate::new(202); 4];
    responses.push(ResponseTemplate::new(200).set_body_bytes(b"LAST".to_vec()));
    Mock::given(method("GET"))
        .respond_with(Sequence::new(responses))
        .mount(&server)
        .await;

    let artifact = client(&server, 5)
        .execute("api/v2/Merge", &json!({}))
        .await
        .unwrap();

    assert_eq!(artifact.bytes(), b"LAST");
    assert_eq!(get_count(&server).await, 5);
}

#[tokio::test]
async fn test_always_pending_times_out_after_exactly_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let err = client(&server, 4)
        .execute("api/v2/Merge", &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::PollTimeout { attempts: 4 }));
    assert!(err.is_timeout());
    assert_eq!(get_count(&server).await, 4);
}

#[tokio::test]
async fn test_poll_error_status_stops_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(202),
            ResponseTemplate::new(500).set_body_string("job crashed"),
        ]))
        .mount(&server)
        .await;

    let err = client(&server, 10)
        .execute("api/v2/Merge", &json!({}))
        .await
        .unwrap_err();

    match err {
        CoreError::RequestFailed { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, b"job crashed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(get_count(&server).await, 2);
}

#[tokio::test]
async fn test_submit_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("server error"))
        .mount(&server)
        .await;

    let err = client(&server, 10)
        .execute("api/v2/Merge", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(err.body(), Some(&b"server error"[..]));
    assert!(err.is_server_error());
    assert_eq!(get_count(&server).await, 0);
}

#[tokio::test]
async fn test_non_202_success_codes_are_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .mount(&server)
        .await;

    let err = client(&server, 10)
        .execute("api/v2/Merge", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(201));
}

#[tokio::test]
async fn test_auth_header_on_submit_and_poll() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Basic test-key"))
        .and(header("Content-Type", "application/json"))
        .respond_with(accepted(&server))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Basic test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let artifact = client(&server, 3)
        .execute("api/v2/Protect", &json!({}))
        .await
        .unwrap();
    assert_eq!(artifact.bytes(), b"ok");
}

#[tokio::test]
async fn test_raw_auth_scheme() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        Pdf4meClient::new(config(&server, 3).with_auth_scheme(AuthScheme::Raw)).unwrap();
    let artifact = client.execute("api/v2/Protect", &json!({})).await.unwrap();
    assert_eq!(artifact.bytes(), b"raw");
}

#[tokio::test]
async fn test_relative_location_resolves_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", "/api/v2/JobStatus/7"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/JobStatus/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"relative".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let artifact = client(&server, 3)
        .execute("api/v2/SplitPdf", &json!({}))
        .await
        .unwrap();
    assert_eq!(artifact.bytes(), b"relative");
}

#[tokio::test]
async fn test_job_status_fallback_polls_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "jobId": "abc" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/JobStatus/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"by-job-id".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        Pdf4meClient::new(config(&server, 3).with_job_status_fallback(true)).unwrap();
    let artifact = client.execute("api/v2/SplitPdf", &json!({})).await.unwrap();
    assert_eq!(artifact.bytes(), b"by-job-id");
}

#[tokio::test]
async fn test_job_id_is_ignored_without_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "jobId": "abc" })))
        .mount(&server)
        .await;

    let err = client(&server, 3)
        .execute("api/v2/SplitPdf", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingLocationHeader));
}

#[tokio::test]
async fn test_cancel_before_first_attempt_issues_no_get() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let (handle, signal) = CancelSignal::pair();
    handle.cancel();

    let client = Pdf4meClient::new(
        config(&server, 10).with_poll_strategy(PollStrategy::fixed(Duration::from_secs(3600), 10)),
    )
    .unwrap();
    let err = client
        .execute_with(
            "api/v2/Merge",
            &json!({}),
            PollOptions::default().with_cancel(signal),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Cancelled { attempts: 0 }));
    assert_eq!(get_count(&server).await, 0);
}

#[tokio::test]
async fn test_cancel_while_polling_stops_further_gets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let (handle, signal) = CancelSignal::pair();
    let options = PollOptions::default()
        .with_cancel(signal)
        .with_progress(Box::new(move |event| {
            if let ProgressEvent::Polling { attempt: 3, .. } = event {
                handle.cancel();
            }
        }));

    let err = client(&server, 100)
        .execute_with("api/v2/Merge", &json!({}), options)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Cancelled { attempts: 2 }));
    assert_eq!(get_count(&server).await, 2);
}

#[tokio::test]
async fn test_cancel_abandons_stalled_poll_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let (handle, signal) = CancelSignal::pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client(&server, 10).execute_with(
            "api/v2/Merge",
            &json!({}),
            PollOptions::default().with_cancel(signal),
        ),
    )
    .await
    .expect("cancellation should not wait for the stalled GET");

    assert!(matches!(result, Err(CoreError::Cancelled { attempts: 0 })));
}

#[tokio::test]
async fn test_cancel_abandons_stalled_submit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let (handle, signal) = CancelSignal::pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client(&server, 10).execute_with(
            "api/v2/Merge",
            &json!({}),
            PollOptions::default().with_cancel(signal),
        ),
    )
    .await
    .expect("cancellation should not wait for the stalled POST");

    assert!(matches!(result, Err(CoreError::Cancelled { attempts: 0 })));
    assert_eq!(get_count(&server).await, 0);
}

#[tokio::test]
async fn test_progress_events_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(Sequence::new(vec![
            ResponseTemplate::new(202),
            ResponseTemplate::new(200).set_body_bytes(b"DONE".to_vec()),
        ]))
        .mount(&server)
        .await;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let options = PollOptions::default().with_progress(Box::new(move |event| {
        let label = match event {
            ProgressEvent::Submitted { .. } => "submitted".to_string(),
            ProgressEvent::Accepted { .. } => "accepted".to_string(),
            ProgressEvent::Polling { attempt, .. } => format!("polling {}", attempt),
            ProgressEvent::Completed { attempts, .. } => format!("completed {}", attempts),
            ProgressEvent::Failed { .. } => "failed".to_string(),
        };
        sink.lock().unwrap().push(label);
    }));

    client(&server, 5)
        .execute_with("api/v2/Merge", &json!({}), options)
        .await
        .unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            "submitted",
            "accepted",
            "polling 1",
            "polling 2",
            "completed 2"
        ]
    );
}

#[tokio::test]
async fn test_failure_is_reported_to_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let failed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failed);
    let options = PollOptions::default().with_progress(Box::new(move |event| {
        if matches!(event, ProgressEvent::Failed { .. }) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }));

    let err = client(&server, 5)
        .execute_with("api/v2/Merge", &json!({}), options)
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(failed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_submit_then_resume_poll() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"resumed".to_vec()))
        .mount(&server)
        .await;

    let client = client(&server, 3);
    let session = match client.submit("api/v2/Merge", &json!({})).await.unwrap() {
        Submission::Accepted(session) => session,
        Submission::Completed(_) => panic!("expected 202"),
    };
    assert_eq!(session.location().path(), "/status/1");
    assert_eq!(session.attempts(), 0);

    let artifact = client
        .poll(session, PollOptions::default())
        .await
        .unwrap();
    assert_eq!(artifact.bytes(), b"resumed");
}

#[tokio::test]
async fn test_poll_saved_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/99"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"saved".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 3);
    let session = client
        .session_for(&format!("{}/status/99", server.uri()))
        .unwrap();
    let artifact = client.poll(session, PollOptions::default()).await.unwrap();
    assert_eq!(artifact.bytes(), b"saved");
}

#[tokio::test]
async fn test_run_sends_catalog_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/Stamp"))
        .and(body_partial_json(json!({
            "docContent": encode_base64(b"%PDF-1.7"),
            "docName": "in.pdf",
            "text": "DRAFT",
            "async": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"stamped".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let request = OperationRequest::builder(Operation::AddTextStamp)
        .document(DocumentInput::from_bytes("in.pdf", b"%PDF-1.7".to_vec()))
        .option("text", "DRAFT")
        .build()
        .unwrap();

    let artifact = client(&server, 3).run(&request).await.unwrap();
    assert_eq!(artifact.bytes(), b"stamped");
}

#[tokio::test]
async fn test_split_envelope_decodes_after_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(accepted(&server))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "splitedDocuments": [
                { "fileName": "part1.pdf", "streamFile": encode_base64(b"one") },
                { "fileName": "part2.pdf", "streamFile": encode_base64(b"two") }
            ]
        })))
        .mount(&server)
        .await;

    let artifact = client(&server, 3)
        .execute("api/v2/SplitPdf", &json!({}))
        .await
        .unwrap();

    assert!(artifact.is_json());
    let docs = artifact.documents().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].name.as_deref(), Some("part1.pdf"));
    assert_eq!(docs[1].bytes, b"two");
}

#[tokio::test]
async fn test_binary_body_is_not_an_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.7 binary".to_vec())
                .insert_header("Content-Type", "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let artifact = client(&server, 3)
        .execute("api/v2/Optimize", &json!({}))
        .await
        .unwrap();

    assert!(!artifact.is_json());
    assert!(matches!(
        artifact.documents(),
        Err(CoreError::MalformedResponse(_))
    ));
    assert_eq!(artifact.bytes(), b"%PDF-1.7 binary");
}
