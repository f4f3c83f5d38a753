use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tr_history::InMemoryHistoryStore;
use tr_test_support::MockHttpServer;

#[tokio::test]
async fn runs_a_plain_get_and_captures_a_body_field() {
    let server = MockHttpServer::start().await;

    let src = format!(
        r#"
# @name health
GET {}
# @capture request status_echo = $.status
"#,
        server.url("/health")
    );
    let doc = tr_parser::parse(&src);
    assert!(doc.errors.is_empty());

    let orchestrator = tr_orchestrator::Orchestrator::new(Arc::new(InMemoryHistoryStore::new())).unwrap();
    let outcome = orchestrator
        .run_request_by_name(&doc, "health", &HashMap::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.context["status"], 200);
    assert_eq!(outcome.captures[0].0, "status_echo");
}

#[tokio::test]
async fn assert_directive_fails_the_run_on_mismatch() {
    let server = MockHttpServer::start().await;

    let src = format!(
        r#"
# @name health
GET {}
# @assert status == 404
"#,
        server.url("/health")
    );
    let doc = tr_parser::parse(&src);

    let orchestrator = tr_orchestrator::Orchestrator::new(Arc::new(InMemoryHistoryStore::new())).unwrap();
    let err = orchestrator
        .run_request_by_name(&doc, "health", &HashMap::new(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), tr_orchestrator::ErrorKind::Assert);
}
