use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tr_document::{CompareSpec, Document, Request};
use tr_resolver::VarTable;

use crate::error::CoreError;
use crate::request_exec::{run_request, Executors};

#[derive(Debug, Clone)]
pub struct CompareResult {
    pub environment: String,
    pub is_baseline: bool,
    pub context: Option<serde_json::Value>,
    pub error: Option<String>,
    /// JSON-pointer-ish dotted paths present in the baseline whose value
    /// differs from this environment's (empty for the baseline itself).
    pub diffs: Vec<String>,
}

/// Runs the same request once per `spec.environments`, each with that
/// environment's process variables layered in, and diffs every other
/// environment's response body against the baseline's (spec §4.8's
/// `@compare`).
pub async fn run_compare(
    executors: &Executors,
    doc: &Document,
    request: &Request,
    spec: &CompareSpec,
    process_vars_by_env: &HashMap<String, HashMap<String, String>>,
    cancel: &CancellationToken,
) -> Result<Vec<CompareResult>, CoreError> {
    let mut contexts = HashMap::new();
    let mut results = Vec::new();

    for env in &spec.environments {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let empty = HashMap::new();
        let process_vars = process_vars_by_env.get(env).unwrap_or(&empty);
        let mut vars = VarTable::default();
        let outcome = run_request(executors, doc, request, &mut vars, process_vars, cancel).await;
        match outcome {
            Ok(ok) => {
                contexts.insert(env.clone(), ok.context.clone());
                results.push(CompareResult {
                    environment: env.clone(),
                    is_baseline: *env == spec.baseline,
                    context: Some(ok.context),
                    error: None,
                    diffs: Vec::new(),
                });
            }
            Err(err) => {
                results.push(CompareResult {
                    environment: env.clone(),
                    is_baseline: *env == spec.baseline,
                    context: None,
                    error: Some(err.to_string()),
                    diffs: Vec::new(),
                });
            }
        }
    }

    let Some(baseline_context) = contexts.get(&spec.baseline).cloned() else {
        return Ok(results);
    };

    for result in &mut results {
        if result.is_baseline {
            continue;
        }
        if let Some(context) = &result.context {
            result.diffs = diff_paths(&baseline_context, context, "$");
        }
    }

    Ok(results)
}

fn diff_paths(a: &serde_json::Value, b: &serde_json::Value, path: &str) -> Vec<String> {
    match (a, b) {
        (serde_json::Value::Object(ma), serde_json::Value::Object(mb)) => {
            let mut diffs = Vec::new();
            for (key, va) in ma {
                let child_path = format!("{path}.{key}");
                match mb.get(key) {
                    Some(vb) => diffs.extend(diff_paths(va, vb, &child_path)),
                    None => diffs.push(child_path),
                }
            }
            for key in mb.keys() {
                if !ma.contains_key(key) {
                    diffs.push(format!("{path}.{key}"));
                }
            }
            diffs
        }
        (va, vb) if va != vb => vec![path.to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_paths_reports_nested_mismatches() {
        let a = serde_json::json!({"status": 200, "body": {"id": 1}});
        let b = serde_json::json!({"status": 200, "body": {"id": 2}});
        assert_eq!(diff_paths(&a, &b, "$"), vec!["$.body.id".to_string()]);
    }

    #[test]
    fn diff_paths_is_empty_for_identical_values() {
        let a = serde_json::json!({"status": 200});
        assert!(diff_paths(&a, &a, "$").is_empty());
    }
}
