use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tr_history::InMemoryHistoryStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(log_level)).init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: termrest <document.http> [request-name]");
        std::process::exit(2);
    };

    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("reading {path}: {e}");
        std::process::exit(1);
    });

    let doc = tr_parser::parse(&text);
    if !doc.errors.is_empty() {
        for err in &doc.errors {
            eprintln!("{path}:{}: {}", err.line, err.message);
        }
    }

    let history = Arc::new(InMemoryHistoryStore::new());
    let orchestrator = tr_orchestrator::Orchestrator::new(history).expect("orchestrator init");
    let cancel = CancellationToken::new();
    let process_vars: HashMap<String, String> = env::vars().collect();

    let requests: Vec<_> = doc.requests().map(|r| r.name().to_string()).collect();
    let targets = match args.next() {
        Some(name) => vec![name],
        None => requests,
    };

    for name in targets {
        info!(request = %name, "running");
        match orchestrator.run_request_by_name(&doc, &name, &process_vars, &cancel).await {
            Ok(outcome) => {
                println!("{name}: {}", outcome.context);
                for test in &outcome.test_results {
                    let mark = if test.passed { "ok" } else { "FAIL" };
                    println!("  [{mark}] {}", test.name);
                }
            }
            Err(err) => {
                eprintln!("{name}: {err} ({:?})", err.kind());
                std::process::exit(1);
            }
        }
    }
}
