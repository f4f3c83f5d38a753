use serde::{Deserialize, Serialize};

use crate::body::BodySource;
use crate::capture_assert::{Apply, Assert, Capture, Use};
use crate::response::HeaderMultiMap;
use crate::script::ScriptBlock;
use crate::settings::Settings;
use crate::ssh::SshSpec;
use crate::variable::Variable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Grpc,
    Ws,
    Wss,
    WebSocket,
}

impl Method {
    pub fn parse(s: &str) -> Option<Method> {
        Some(match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "GRPC" => Method::Grpc,
            "WS" => Method::Ws,
            "WSS" => Method::Wss,
            "WEBSOCKET" => Method::WebSocket,
            _ => return None,
        })
    }

    pub fn is_websocket(self) -> bool {
        matches!(self, Method::Ws | Method::Wss | Method::WebSocket)
    }
}

/// Authentication directive attached to a request's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthSpec {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl Default for AuthSpec {
    fn default() -> Self {
        AuthSpec::None
    }
}

/// `@for-each` iteration spec: a variable name bound to each item of a
/// collection expression (e.g. a captured JSON array, or an inline CSV list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForEachSpec {
    pub var_name: String,
    pub collection_expr: String,
}

/// gRPC-specific payload for a Request tagged via the `GRPC` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrpcRequest {
    /// The dial target, taken from the URL tail of a `GRPC host:port` line.
    pub target: String,
    /// `package.Service/Method` or `/Service/Method`.
    pub full_method: Option<String>,
    pub descriptor_path: Option<String>,
    pub use_reflection: bool,
    pub metadata: HeaderMultiMap,
    pub message_json: String,
    pub streaming: GrpcStreaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrpcStreaming {
    Unary,
    ClientStream,
    ServerStream,
    Bidi,
}

/// A single scripted WebSocket step, per §4.5.4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WsStep {
    Send(String),
    SendJson(serde_json::Value),
    SendBase64(String),
    SendFile(String),
    Ping,
    Pong,
    Wait(std::time::Duration),
    Close { code: u16, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSocketSpec {
    pub subprotocols: Vec<String>,
    pub compression: bool,
    pub idle_timeout: Option<std::time::Duration>,
    pub max_message_bytes: Option<usize>,
    pub steps: Vec<WsStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseSpec {
    pub last_event_id: Option<String>,
    /// Max automatic reconnects on transport error, honoring server `retry`.
    pub max_reconnects: u32,
}

/// Exactly one of these is attached to a Request, selecting its transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportPayload {
    Http,
    Grpc(GrpcRequest),
    WebSocket(WebSocketSpec),
    Sse(SseSpec),
}

impl Default for TransportPayload {
    fn default() -> Self {
        TransportPayload::Http
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub auth: AuthSpec,
    pub when: Option<String>,
    pub for_each: Option<ForEachSpec>,
    pub captures: Vec<Capture>,
    pub asserts: Vec<Assert>,
    pub applies: Vec<Apply>,
    pub trace: crate::trace::TraceSpec,
    pub profile: Option<crate::profile_compare::ProfileSpec>,
    pub compare: Option<crate::profile_compare::CompareSpec>,
    pub scripts: Vec<ScriptBlock>,
    pub uses: Vec<Use>,
    pub ssh: Option<SshSpec>,
    pub log_sensitive_headers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMultiMap,
    pub body: BodySource,
    pub variables: Vec<Variable>,
    pub metadata: RequestMetadata,
    pub settings: Settings,
    pub transport: TransportPayload,
    pub line: usize,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>, line: usize) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMultiMap::new(),
            body: BodySource::default(),
            variables: Vec::new(),
            metadata: RequestMetadata::default(),
            settings: Settings::new(),
            transport: TransportPayload::default(),
            line,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or(&self.url)
    }
}
