use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named span within a network trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Dns,
    Connect,
    Tls,
    RequestHeaders,
    RequestBody,
    Ttfb,
    Transfer,
}

impl PhaseKind {
    /// Natural life-cycle order (not wall-clock) used to order a Timeline.
    pub const ORDER: [PhaseKind; 7] = [
        PhaseKind::Dns,
        PhaseKind::Connect,
        PhaseKind::Tls,
        PhaseKind::RequestHeaders,
        PhaseKind::RequestBody,
        PhaseKind::Ttfb,
        PhaseKind::Transfer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Dns => "dns",
            PhaseKind::Connect => "connect",
            PhaseKind::Tls => "tls",
            PhaseKind::RequestHeaders => "request_headers",
            PhaseKind::RequestBody => "request_body",
            PhaseKind::Ttfb => "ttfb",
            PhaseKind::Transfer => "transfer",
        }
    }
}

/// Per-phase metadata attached opportunistically by the recorder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseMeta {
    pub addr: Option<String>,
    pub reused: Option<bool>,
    pub cached: Option<bool>,
    pub tls_protocol: Option<String>,
    pub tls_cipher: Option<String>,
    pub tls_alpn: Option<String>,
    pub tls_server_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration: Duration,
    pub meta: PhaseMeta,
    pub err: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub started: DateTime<Utc>,
    pub completed: DateTime<Utc>,
    pub duration: Duration,
    pub phases: Vec<Phase>,
    pub details: Option<serde_json::Value>,
    pub err: Option<String>,
}

impl Timeline {
    pub fn phase(&self, kind: PhaseKind) -> Option<&Phase> {
        self.phases.iter().find(|p| p.kind == kind)
    }
}

/// Per-phase and total latency budgets with a shared tolerance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Budgets {
    pub total: Option<Duration>,
    pub tolerance: Duration,
    pub phases: HashMap<PhaseKind, Duration>,
}

/// Whether/how tracing is requested for a request (`@trace`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSpec {
    pub enabled: bool,
    pub budgets: Budgets,
}

/// A single budget violation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BreachKind {
    Phase(PhaseKind),
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breach {
    pub kind: BreachKind,
    pub limit: Duration,
    pub actual: Duration,
    pub over: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub breaches: Vec<Breach>,
}

impl Report {
    pub fn within_budget(&self) -> bool {
        self.breaches.is_empty()
    }
}
