use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tr_document::{Document, ForEachStep, IfStep, OnFailure, RequestStep, SwitchStep, WorkflowStep};
use tr_resolver::VarTable;

use crate::error::CoreError;
use crate::request_exec::{run_request, Executors, RequestOutcome};

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step_name: Option<String>,
    pub outcome: Result<RequestOutcome, String>,
}

/// Interprets a workflow's step tree against a document (spec §4.8): plain
/// requests dispatch through [`run_request`], `If`/`Switch` evaluate their
/// condition against the most recently produced context, and `ForEach`
/// re-runs its body once per collection item with the loop variable bound.
pub async fn run_steps(
    executors: &Executors,
    doc: &Document,
    steps: &[WorkflowStep],
    vars: &mut VarTable,
    process_vars: &HashMap<String, String>,
    last_context: &mut serde_json::Value,
    results: &mut Vec<StepOutcome>,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    for step in steps {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        match step {
            WorkflowStep::Request(req_step) => {
                run_request_step(executors, doc, req_step, vars, process_vars, last_context, results, cancel).await?;
            }
            WorkflowStep::If(if_step) => {
                run_if_step(executors, doc, if_step, vars, process_vars, last_context, results, cancel).await?;
            }
            WorkflowStep::Switch(switch_step) => {
                run_switch_step(executors, doc, switch_step, vars, process_vars, last_context, results, cancel).await?;
            }
            WorkflowStep::ForEach(for_each_step) => {
                run_for_each_step(executors, doc, for_each_step, vars, process_vars, last_context, results, cancel).await?;
            }
        }
    }
    Ok(())
}

async fn run_request_step(
    executors: &Executors,
    doc: &Document,
    step: &RequestStep,
    vars: &mut VarTable,
    process_vars: &HashMap<String, String>,
    last_context: &mut serde_json::Value,
    results: &mut Vec<StepOutcome>,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    let request = doc
        .find_request(&step.using)
        .ok_or_else(|| CoreError::UnknownRequest(step.using.clone()))?;

    if let Some(cond) = &step.when {
        if !crate::eval::eval_bool(cond, last_context, &[])? {
            return Ok(());
        }
    }

    for (name, value) in &step.vars {
        tr_resolver::capture_into(vars, tr_document::Scope::Request, name.clone(), value.clone(), false);
    }

    let outcome = run_request(executors, doc, request, vars, process_vars, cancel).await;
    match outcome {
        Ok(ok) => {
            *last_context = ok.context.clone();
            check_expect(&step.expect, &ok.context)?;
            results.push(StepOutcome {
                step_name: step.name.clone(),
                outcome: Ok(ok),
            });
            Ok(())
        }
        Err(err) if step.on_failure == OnFailure::Continue => {
            results.push(StepOutcome {
                step_name: step.name.clone(),
                outcome: Err(err.to_string()),
            });
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn check_expect(expect: &tr_document::ExpectSpec, context: &serde_json::Value) -> Result<(), CoreError> {
    if let Some(status) = expect.status {
        let actual = context.get("status").and_then(serde_json::Value::as_u64).unwrap_or_default();
        if actual != u64::from(status) {
            return Err(CoreError::AssertFailed(format!("expected status {status}, got {actual}")));
        }
    }
    for (path, expected) in &expect.fields {
        let actual = crate::eval::eval_capture(path, context).map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        match actual {
            Ok(actual) if &actual == expected => {}
            Ok(actual) => return Err(CoreError::AssertFailed(format!("{path}: expected {expected:?}, got {actual:?}"))),
            Err(_) => return Err(CoreError::AssertFailed(format!("{path}: did not match"))),
        }
    }
    Ok(())
}

async fn run_if_step(
    executors: &Executors,
    doc: &Document,
    step: &IfStep,
    vars: &mut VarTable,
    process_vars: &HashMap<String, String>,
    last_context: &mut serde_json::Value,
    results: &mut Vec<StepOutcome>,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    if crate::eval::eval_bool(&step.cond, last_context, &[])? {
        return Box::pin(run_steps(executors, doc, &step.then_branch, vars, process_vars, last_context, results, cancel)).await;
    }
    for (cond, branch) in &step.elif_branches {
        if crate::eval::eval_bool(cond, last_context, &[])? {
            return Box::pin(run_steps(executors, doc, branch, vars, process_vars, last_context, results, cancel)).await;
        }
    }
    Box::pin(run_steps(executors, doc, &step.else_branch, vars, process_vars, last_context, results, cancel)).await
}

async fn run_switch_step(
    executors: &Executors,
    doc: &Document,
    step: &SwitchStep,
    vars: &mut VarTable,
    process_vars: &HashMap<String, String>,
    last_context: &mut serde_json::Value,
    results: &mut Vec<StepOutcome>,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    let subject = crate::eval::eval_string(&step.expr, last_context, &[])?;
    for case in &step.cases {
        if case.value == subject {
            return Box::pin(run_steps(executors, doc, &case.body, vars, process_vars, last_context, results, cancel)).await;
        }
    }
    if let Some(default) = &step.default {
        return Box::pin(run_steps(executors, doc, default, vars, process_vars, last_context, results, cancel)).await;
    }
    Ok(())
}

async fn run_for_each_step(
    executors: &Executors,
    doc: &Document,
    step: &ForEachStep,
    vars: &mut VarTable,
    process_vars: &HashMap<String, String>,
    last_context: &mut serde_json::Value,
    results: &mut Vec<StepOutcome>,
    cancel: &CancellationToken,
) -> Result<(), CoreError> {
    let items = collect_for_each_items(&step.for_each.collection_expr, last_context, vars)?;
    for item in items {
        tr_resolver::capture_into(vars, tr_document::Scope::Request, step.for_each.var_name.clone(), item, false);
        Box::pin(run_steps(executors, doc, &step.body, vars, process_vars, last_context, results, cancel)).await?;
    }
    Ok(())
}

/// Resolves a `@for-each` collection expression: either a JSONPath into the
/// last response context (`$.body.items[*]`) or a flat comma-separated
/// inline list.
fn collect_for_each_items(expr: &str, context: &serde_json::Value, vars: &VarTable) -> Result<Vec<String>, CoreError> {
    if let Some(rest) = expr.strip_prefix('$') {
        let path = format!("${rest}");
        let value = crate::eval::eval_capture(&path, context)?;
        return Ok(match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
            other => vec![other.to_string()],
        });
    }
    let expanded = tr_resolver::expand(expr, vars);
    Ok(expanded.text.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}
