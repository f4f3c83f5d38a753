use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tr_document::{Document, Request, TransportPayload};
use tr_history::{HistoryEntry, HistoryStore};
use tr_resolver::VarTable;
use tr_scripts::{ScriptState, ScriptsHost};
use tr_stream::StreamRegistry;
use tr_trace::Recorder;
use tr_transport::{ExecRequest, GrpcExecutor, HttpExecutor, SseExecutor, WsExecutor};
use uuid::Uuid;

use crate::error::CoreError;

/// Everything a single request execution needs that outlives the call:
/// transport clients, the stream registry, and the history sink. Built
/// once per orchestrator and shared across every request it runs.
pub struct Executors {
    pub http: HttpExecutor,
    pub sse: SseExecutor,
    pub ws: WsExecutor,
    pub grpc: GrpcExecutor,
    pub streams: Arc<StreamRegistry>,
    pub history: Arc<dyn HistoryStore>,
    pub scripts: ScriptsHost,
}

impl Executors {
    pub fn new(history: Arc<dyn HistoryStore>) -> Result<Self, CoreError> {
        Ok(Self {
            http: HttpExecutor::new()?,
            sse: SseExecutor::new()?,
            ws: WsExecutor::new(),
            grpc: GrpcExecutor::new(),
            streams: Arc::new(StreamRegistry::new()),
            history,
            scripts: ScriptsHost::new(std::time::Duration::from_secs(30)),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub context: serde_json::Value,
    pub test_results: Vec<tr_scripts::TestResult>,
    pub captures: Vec<(String, serde_json::Value)>,
    pub trace: Option<tr_document::Timeline>,
    pub report: Option<tr_document::Report>,
}

/// Runs one request end to end: resolve templates, run pre-request
/// scripts, dispatch to the matching transport, run test scripts, evaluate
/// captures/asserts, and record history (spec §4.8 composing §4.2–§4.7).
pub async fn run_request(
    executors: &Executors,
    doc: &Document,
    request: &Request,
    vars: &mut VarTable,
    process_vars: &HashMap<String, String>,
    cancel: &CancellationToken,
) -> Result<RequestOutcome, CoreError> {
    if cancel.is_cancelled() {
        return Err(CoreError::Cancelled);
    }

    *vars = tr_resolver::table_for(doc, request, process_vars);
    let mut resolved = tr_resolver::resolve_request(request, vars);

    let pre_request_scripts: Vec<_> = request
        .metadata
        .scripts
        .iter()
        .filter(|s| s.kind == tr_document::ScriptKind::PreRequest)
        .cloned()
        .collect();

    if !pre_request_scripts.is_empty() {
        let state = ScriptState {
            request_url: resolved.url.clone(),
            request_headers: resolved.headers.iter().map(|(n, v, _)| (n.clone(), v.clone())).collect(),
            request_body: resolved.body.clone(),
            ..Default::default()
        };
        let out = executors.scripts.run_pre_request(&pre_request_scripts, state, cancel.clone())?;
        resolved.url = out.request_url;
        resolved.headers = out.request_headers.into_iter().map(|(n, v)| (n, v, false)).collect();
        resolved.body = out.request_body;
        for (name, (value, secret)) in out.variables {
            tr_resolver::capture_into(vars, tr_document::Scope::Request, name, value, secret);
        }
    }

    let exec_req = ExecRequest {
        url: resolved.url.clone(),
        headers: resolved.headers.iter().map(|(n, v, _)| (n.clone(), v.clone())).collect(),
        body: resolved.body.clone().map(String::into_bytes),
        timeout: request
            .settings
            .get(tr_document::settings::keys::TIMEOUT)
            .and_then(|s| humantime_like_parse(s)),
    };

    let started = Utc::now();
    let mut recorder = Recorder::new(started);

    let response = match &request.transport {
        TransportPayload::Http => executors.http.execute(request.method, &exec_req, &mut recorder).await?,
        TransportPayload::Sse(spec) => {
            let session = executors.streams.open();
            executors.sse.execute(&exec_req, spec, session, &mut recorder).await?
        }
        TransportPayload::WebSocket(spec) => {
            let session = executors.streams.open();
            let (response, _handle) = executors.ws.execute(&exec_req, spec, session, &mut recorder).await?;
            response
        }
        TransportPayload::Grpc(grpc) => {
            let source = resolve_grpc_source(grpc).await?;
            executors.grpc.execute(grpc, source.as_ref(), &mut recorder).await?
        }
    };

    let timeline = recorder.finish(Utc::now(), None);
    let report = if request.metadata.trace.enabled {
        Some(tr_trace::evaluate(&timeline, &request.metadata.trace.budgets))
    } else {
        None
    };

    let body_json = serde_json::from_slice::<serde_json::Value>(&response.body).unwrap_or(serde_json::Value::Null);
    let context = serde_json::json!({
        "status": response.status_code,
        "headers": response.headers.iter().cloned().collect::<HashMap<_, _>>(),
        "body": body_json,
    });

    let mut test_results = Vec::new();
    let test_scripts: Vec<_> = request
        .metadata
        .scripts
        .iter()
        .filter(|s| s.kind == tr_document::ScriptKind::Test)
        .cloned()
        .collect();
    if !test_scripts.is_empty() {
        let state = ScriptState {
            response_status: Some(response.status_code),
            response_headers: response.headers.iter().cloned().collect(),
            response_body: Some(String::from_utf8_lossy(&response.body).to_string()),
            ..Default::default()
        };
        let out = executors.scripts.run_test(&test_scripts, state, cancel.clone())?;
        test_results = out.test_results;
    }

    for assert in &request.metadata.asserts {
        let var_snapshot: Vec<(String, String)> = Vec::new();
        let ok = crate::eval::eval_bool(&assert.expression, &context, &var_snapshot)?;
        if !ok {
            return Err(CoreError::AssertFailed(
                assert.message.clone().unwrap_or_else(|| assert.expression.clone()),
            ));
        }
    }

    let mut captures = Vec::new();
    for capture in &request.metadata.captures {
        let value = crate::eval::eval_capture(&capture.expression, &context)?;
        let as_string = match &value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        tr_resolver::capture_into(vars, capture.scope, capture.name.clone(), as_string, capture.secret);
        captures.push((capture.name.clone(), value));
    }

    executors
        .history
        .record(HistoryEntry {
            id: Uuid::new_v4(),
            recorded_at: started,
            request_name: request.name().to_string(),
            method: format!("{:?}", request.method),
            url: response.url.clone(),
            status_code: response.status_code,
            duration_ms: timeline.duration.as_millis() as u64,
            snapshot: redact_snapshot(&context, resolved.secret),
        })
        .await?;

    Ok(RequestOutcome {
        context,
        test_results,
        captures,
        trace: request.metadata.trace.enabled.then_some(timeline),
        report,
    })
}

fn redact_snapshot(context: &serde_json::Value, secret: bool) -> serde_json::Value {
    if secret {
        serde_json::json!({ "redacted": true })
    } else {
        context.clone()
    }
}

async fn resolve_grpc_source(
    grpc: &tr_document::GrpcRequest,
) -> Result<Box<dyn tr_transport::grpc::DescriptorSource>, CoreError> {
    if let Some(path) = &grpc.descriptor_path {
        let source = tr_transport::grpc::FileDescriptorSource::from_file(path)
            .await
            .map_err(CoreError::Transport)?;
        Ok(Box::new(source))
    } else {
        Ok(Box::new(tr_transport::grpc::ReflectionDescriptorSource))
    }
}

fn humantime_like_parse(s: &str) -> Option<std::time::Duration> {
    let s = s.trim();
    let unit = s.chars().last()?;
    let (amount, unit) = if unit.is_ascii_digit() {
        (s.parse::<u64>().ok()?, 's')
    } else {
        (s[..s.len() - unit.len_utf8()].parse::<u64>().ok()?, unit)
    };
    Some(match unit {
        's' => std::time::Duration::from_secs(amount),
        'm' => std::time::Duration::from_secs(amount * 60),
        'h' => std::time::Duration::from_secs(amount * 3600),
        _ => return None,
    })
}
