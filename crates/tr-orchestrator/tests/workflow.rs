use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tr_document::WorkflowStep;
use tr_history::InMemoryHistoryStore;
use tr_test_support::MockHttpServer;

#[tokio::test]
async fn if_branch_runs_the_matching_step_based_on_prior_status() {
    let server = MockHttpServer::start().await;

    let src = format!(
        r#"
# @name health
GET {}

###

@workflow smoke
@step using=health name=check-health
@if status == 200
@step using=health name=confirm
@else
@step using=health name=fallback
"#,
        server.url("/health")
    );
    let doc = tr_parser::parse(&src);
    assert!(doc.errors.is_empty());

    let orchestrator = tr_orchestrator::Orchestrator::new(Arc::new(InMemoryHistoryStore::new())).unwrap();
    let results = orchestrator
        .run_workflow_by_name(&doc, "smoke", &HashMap::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].step_name.as_deref(), Some("check-health"));
    assert_eq!(results[1].step_name.as_deref(), Some("confirm"));
    assert!(results[1].outcome.is_ok());
}

#[tokio::test]
async fn for_each_runs_the_body_once_per_inline_item() {
    let server = MockHttpServer::start().await;

    let src = format!(
        r#"
# @name health
GET {}

###

@workflow loop
@for-each item in a,b,c
@step using=health name=visit
"#,
        server.url("/health")
    );
    let doc = tr_parser::parse(&src);
    assert!(doc.errors.is_empty());
    assert_eq!(doc.find_workflow("loop").unwrap().steps.len(), 1);
    assert!(matches!(doc.find_workflow("loop").unwrap().steps[0], WorkflowStep::ForEach(_)));

    let orchestrator = tr_orchestrator::Orchestrator::new(Arc::new(InMemoryHistoryStore::new())).unwrap();
    let results = orchestrator
        .run_workflow_by_name(&doc, "loop", &HashMap::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.step_name.as_deref() == Some("visit")));
}
