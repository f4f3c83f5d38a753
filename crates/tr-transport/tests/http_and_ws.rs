use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tr_document::{Method, WebSocketSpec, WsStep};
use tr_stream::StreamSession;
use tr_trace::Recorder;
use tr_transport::{ExecRequest, HttpExecutor, WsExecutor};

#[tokio::test]
async fn http_executor_round_trips_against_a_mock_server() {
    let server = tr_test_support::MockHttpServer::start().await;
    let executor = HttpExecutor::new().unwrap();
    let req = ExecRequest {
        url: server.url("/health"),
        headers: Vec::new(),
        body: None,
        timeout: None,
    };
    let mut recorder = Recorder::new(Utc::now());

    let response = executor.execute(Method::Get, &req, &mut recorder).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, b"ok");
}

#[tokio::test]
async fn ws_executor_connects_and_plays_back_scripted_sends() {
    let server = tr_test_support::MockWsServer::start().await;
    let executor = WsExecutor::new();
    let req = ExecRequest {
        url: server.url(),
        headers: Vec::new(),
        body: None,
        timeout: None,
    };
    let spec = WebSocketSpec {
        subprotocols: Vec::new(),
        compression: false,
        idle_timeout: None,
        max_message_bytes: None,
        steps: vec![WsStep::Send("ping".to_string())],
    };
    let session = Arc::new(StreamSession::new());
    let mut recorder = Recorder::new(Utc::now());

    let (response, _handle) = executor.execute(&req, &spec, Arc::clone(&session), &mut recorder).await.unwrap();
    assert_eq!(response.status_code, 101);

    // The echo server reflects the frame back; give the reader task a beat to republish it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (replayed, _rx) = session.subscribe();
    assert!(replayed.iter().any(|m| m.payload["text"] == "ping"));
}
