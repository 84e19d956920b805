//! Traffic generator behavior against mock and real servers.

use std::time::Duration;

use telemetry_demo::config::ClientConfig;
use telemetry_demo::lifecycle::Shutdown;
use telemetry_demo::observability::Severity;
use telemetry_demo::traffic::{StopReason, TrafficGenerator, DEFAULT_ENDPOINTS};

mod common;

const API_BODY: &str = r#"{"message":"ok","timestamp":"2024-01-01T00:00:00Z","server":"mock","request_id":"req-mock"}"#;

fn client_config(server_url: String, total_requests: u64) -> ClientConfig {
    ClientConfig {
        server_url,
        request_delay_ms: 20,
        client_name: "test-client".to_string(),
        total_requests,
        request_timeout_secs: 2,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_bounded_run_sends_exactly_n_requests_round_robin() {
    let (addr, seen) = common::start_recording_backend(API_BODY).await;
    let (emitter, sink) = common::memory_emitter();
    let shutdown = Shutdown::new();

    let generator = TrafficGenerator::new(client_config(format!("http://{}", addr), 7), emitter).unwrap();
    let report = tokio::time::timeout(Duration::from_secs(5), generator.run(shutdown.subscribe()))
        .await
        .expect("generator should finish on its own");

    assert_eq!(report.requests_made, 7);
    assert_eq!(report.stop_reason, StopReason::Completed);

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 7);
    for (i, request) in seen.iter().enumerate() {
        assert_eq!(request.path, DEFAULT_ENDPOINTS[i % DEFAULT_ENDPOINTS.len()]);
        assert_eq!(request.header("x-client-name"), Some("test-client"));
        assert_eq!(request.header("user-agent"), Some("test-client"));
        let expected_num = (i + 1).to_string();
        assert_eq!(request.header("x-request-number"), Some(expected_num.as_str()));
    }

    let completed = sink.with_message("HTTP request completed");
    assert_eq!(completed.len(), 7);
    assert!(completed.iter().all(|r| r.request_id() == "req-mock"));
    assert_eq!(completed[0].field("server_name").unwrap(), "mock");

    let done = sink.with_message("Client completed all requests");
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].field("requests_completed").unwrap(), 7);
}

#[tokio::test]
async fn test_unparsable_body_is_logged_raw() {
    let (addr, _seen) = common::start_recording_backend("not json at all").await;
    let (emitter, sink) = common::memory_emitter();
    let shutdown = Shutdown::new();

    let generator = TrafficGenerator::new(client_config(format!("http://{}", addr), 2), emitter).unwrap();
    generator.run(shutdown.subscribe()).await;

    let raw = sink.with_message("HTTP request completed (raw response)");
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].field("response_body").unwrap(), "not json at all");
    assert_eq!(raw[0].request_id(), "");
}

#[tokio::test]
async fn test_failures_are_logged_and_counted() {
    let addr = common::unreachable_addr().await;
    let (emitter, sink) = common::memory_emitter();
    let shutdown = Shutdown::new();

    let generator = TrafficGenerator::new(client_config(format!("http://{}", addr), 3), emitter).unwrap();
    let report = tokio::time::timeout(Duration::from_secs(10), generator.run(shutdown.subscribe()))
        .await
        .unwrap();

    // Failed requests still advance the counter.
    assert_eq!(report.requests_made, 3);
    assert_eq!(report.stop_reason, StopReason::Completed);

    let failed = sink.with_message("HTTP request failed");
    assert_eq!(failed.len(), 3);
    assert!(failed.iter().all(|r| r.level() == Severity::Error));
    assert_eq!(failed[2].field("request_num").unwrap(), 3);
}

#[tokio::test]
async fn test_shutdown_cancels_unbounded_run() {
    let (addr, seen) = common::start_recording_backend(API_BODY).await;
    let (emitter, sink) = common::memory_emitter();
    let shutdown = Shutdown::new();

    let generator = TrafficGenerator::new(client_config(format!("http://{}", addr), 0), emitter).unwrap();
    let handle = tokio::spawn(generator.run(shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(150)).await;
    shutdown.trigger();

    let report = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("generator should stop promptly")
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(report.requests_made >= 1);
    // A request cut short by shutdown counts as made but may not have reached the backend.
    let seen = seen.lock().unwrap().len() as u64;
    assert!(seen <= report.requests_made && report.requests_made <= seen + 1);

    let stopping = sink.with_message("Client stopping");
    assert_eq!(stopping.len(), 1);
    assert_eq!(
        stopping[0].field("total_requests_made").unwrap(),
        report.requests_made
    );
}

#[tokio::test]
async fn test_shutdown_abandons_request_in_flight() {
    let (addr, accepted) = common::start_silent_backend().await;
    let (emitter, sink) = common::memory_emitter();
    let shutdown = Shutdown::new();

    let mut config = client_config(format!("http://{}", addr), 0);
    config.request_timeout_secs = 5;
    let generator = TrafficGenerator::new(config, emitter).unwrap();
    let handle = tokio::spawn(generator.run(shutdown.subscribe()));

    // First request goes out at 20ms and hangs.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*accepted.lock().unwrap(), 1);
    shutdown.trigger();

    let report = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("shutdown should not wait for the request timeout")
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(report.requests_made, 1);

    let failed = sink.with_message("HTTP request failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].level(), Severity::Error);
    assert_eq!(failed[0].field("request_num").unwrap(), 1);
    assert_eq!(
        sink.with_message("Client stopping")[0]
            .field("total_requests_made")
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_shutdown_before_first_tick_sends_nothing() {
    let (addr, seen) = common::start_recording_backend(API_BODY).await;
    let (emitter, _sink) = common::memory_emitter();
    let shutdown = Shutdown::new();
    shutdown.trigger();

    let generator = TrafficGenerator::new(client_config(format!("http://{}", addr), 5), emitter).unwrap();
    let report = generator.run(shutdown.subscribe()).await;

    assert_eq!(report.requests_made, 0);
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_generator_against_demo_server() {
    let server = common::spawn_server(common::fast_server_config(), Duration::from_secs(5)).await;
    let (emitter, client_sink) = common::memory_emitter();
    let shutdown = Shutdown::new();

    let generator = TrafficGenerator::new(client_config(server.url(""), 5), emitter).unwrap();
    let report = generator.run(shutdown.subscribe()).await;
    assert_eq!(report.requests_made, 5);

    // One record per endpoint on the server side.
    for message in [
        "HTTP request served",
        "API data request served",
        "Slow request served",
        "Health check requested",
    ] {
        assert_eq!(server.sink.with_message(message).len(), 1, "{}", message);
    }
    let error_records = server.sink.with_message("Error endpoint returned 500").len()
        + server.sink.with_message("Error endpoint returned success").len();
    assert_eq!(error_records, 1);

    // Client and server records share the request id.
    let server_ids: Vec<String> = server
        .sink
        .records()
        .iter()
        .map(|r| r.request_id().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    for record in client_sink.with_message("HTTP request completed") {
        assert!(server_ids.contains(&record.request_id().to_string()));
    }

    server.shutdown.trigger();
}
