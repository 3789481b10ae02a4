//! HTTP integration tests against a mock control server
//!
//! The transport is blocking, so every call runs inside `spawn_blocking`.

use std::time::{Duration as StdDuration, Instant};

use serde_json::json;
use wiremock::matchers::{body_bytes, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use memo_node::application::ports::{HttpRequest, HttpTransport, TransportError};
use memo_node::application::{
    ControllerSettings, PollerConfig, RecordingController, StatusPoller, TickEvent,
    UploadOutcome, UploadPipeline,
};
use memo_node::domain::metrics::QualityMetrics;
use memo_node::domain::poll::Intent;
use memo_node::domain::recording::{AudioFormat, Duration};
use memo_node::domain::session::SessionState;
use memo_node::infrastructure::{ReqwestTransport, SyntheticCaptureSource};

fn poller(server_url: String, timeout: Duration) -> StatusPoller<ReqwestTransport> {
    StatusPoller::new(
        ReqwestTransport::new(),
        PollerConfig {
            server_url,
            device_id: "memo-test".parse().unwrap(),
            interval: Duration::from_secs(1),
            timeout,
            failure_ceiling: 3,
        },
    )
}

fn pipeline(server_url: String) -> UploadPipeline<ReqwestTransport> {
    UploadPipeline::new(
        ReqwestTransport::new(),
        server_url,
        "memo-test".parse().unwrap(),
        AudioFormat::default(),
    )
}

#[tokio::test]
async fn status_poll_reads_recording_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .and(query_param("device", "memo-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "recording": true })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let intent = tokio::task::spawn_blocking(move || {
        poller(uri, Duration::from_secs(1)).poll()
    })
    .await
    .unwrap();

    assert_eq!(intent, Intent::fresh(true));
}

#[tokio::test]
async fn status_server_error_holds_last_intent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "recording": true })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (first, second, failures) = tokio::task::spawn_blocking(move || {
        let mut poller = poller(uri, Duration::from_secs(1));
        let first = poller.poll();
        let second = poller.poll();
        (first, second, poller.state().consecutive_failures())
    })
    .await
    .unwrap();

    assert_eq!(first, Intent::fresh(true));
    assert_eq!(second, Intent::stale(true));
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn status_malformed_body_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recording"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let intent = tokio::task::spawn_blocking(move || {
        poller(uri, Duration::from_secs(1)).poll()
    })
    .await
    .unwrap();

    assert_eq!(intent, Intent::stale(false));
}

#[tokio::test]
async fn slow_status_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "recording": true }))
                .set_delay(StdDuration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let url = format!("{}/status?device=memo-test", server.uri());
    let result = tokio::task::spawn_blocking(move || {
        ReqwestTransport::new().send(&HttpRequest::get(url, Duration::from_millis(200)))
    })
    .await
    .unwrap();

    assert_eq!(result, Err(TransportError::ReadTimeout));
}

#[tokio::test]
async fn upload_sends_pcm_with_metadata() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();

    Mock::given(method("POST"))
        .and(path("/audio"))
        .and(query_param("device", "memo-test"))
        .and(query_param("rate", "16000"))
        .and(query_param("bits", "16"))
        .and(query_param("channels", "1"))
        .and(header("Content-Type", "application/octet-stream"))
        .and(header("X-Audio-Format", "pcm"))
        .and(header("X-Sample-Rate", "16000"))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let body = payload.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut metrics = QualityMetrics::default();
        metrics.observe_pcm_le(&body);
        pipeline(uri).upload(&body, &metrics)
    })
    .await
    .unwrap();

    assert_eq!(outcome, UploadOutcome::Success { status: 204 });

    let requests = server.received_requests().await.unwrap();
    let headers = &requests[0].headers;
    assert!(headers.get("x-audio-avg-db").is_some());
    assert!(headers.get("x-audio-total-chunks").is_some());
    assert_eq!(headers.get("x-audio-error-count").unwrap(), "0");
}

#[tokio::test]
async fn upload_rejection_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio"))
        .respond_with(ResponseTemplate::new(413).set_body_string("too large"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let outcome = tokio::task::spawn_blocking(move || {
        pipeline(uri).upload(&[0u8; 64], &QualityMetrics::default())
    })
    .await
    .unwrap();

    assert_eq!(
        outcome,
        UploadOutcome::Failed {
            code: 413,
            description: "HTTP 413: too large".to_string(),
        }
    );
}

#[tokio::test]
async fn upload_to_missing_server_is_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let outcome = tokio::task::spawn_blocking(move || {
        pipeline(uri).upload(&[1, 2, 3, 4], &QualityMetrics::default())
    })
    .await
    .unwrap();

    assert!(matches!(outcome, UploadOutcome::Failed { code: -1, .. }));
}

#[tokio::test]
async fn controller_records_and_uploads_one_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "recording": true })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "recording": false })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/audio"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let (states, report) = tokio::task::spawn_blocking(move || {
        let format = AudioFormat::default();
        let transport = ReqwestTransport::new();
        let mut controller = RecordingController::new(
            SyntheticCaptureSource::new(format).unpaced(),
            StatusPoller::new(
                transport.clone(),
                PollerConfig {
                    server_url: uri.clone(),
                    device_id: "memo-test".parse().unwrap(),
                    interval: Duration::from_secs(1),
                    timeout: Duration::from_secs(1),
                    failure_ceiling: 3,
                },
            ),
            UploadPipeline::new(transport, uri, "memo-test".parse().unwrap(), format),
            ControllerSettings {
                format,
                max_duration: Duration::from_secs(5),
                idle_interval: Duration::from_millis(100),
                silence_threshold_db: -40.0,
            },
        )
        .unwrap();

        let t0 = Instant::now();
        let at = |ms: u64| t0 + StdDuration::from_millis(ms);
        let mut states = Vec::new();

        controller.tick(at(0)).unwrap();
        states.push(controller.state());
        for ms in [10, 20, 30] {
            controller.tick(at(ms)).unwrap();
        }
        controller.tick(at(1000)).unwrap();
        states.push(controller.state());
        let report = match controller.tick(at(1001)).unwrap() {
            TickEvent::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };
        states.push(controller.state());
        (states, report)
    })
    .await
    .unwrap();

    assert_eq!(
        states,
        vec![SessionState::Recording, SessionState::Uploading, SessionState::Idle]
    );
    // Three 512-sample frames
    assert_eq!(report.bytes, 3 * 1024);
    assert_eq!(report.metrics.total_chunks(), 3);
    assert_eq!(report.outcome, Some(UploadOutcome::Success { status: 200 }));

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/audio")
        .unwrap();
    assert_eq!(upload.body.len(), 3 * 1024);
}
