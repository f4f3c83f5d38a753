use std::time::Duration;

use tr_document::{
    Apply, Assert, AuthSpec, Capture, CompareSpec, Document, ExpectSpec, ForEachSpec, GrpcRequest,
    GrpcStreaming, Item, Method, OnFailure, ParseError, PhaseKind, ProfileSpec, Request,
    RequestStep, Scope, ScriptBlock, ScriptKind, ScriptLang, ScriptSource, SseSpec, SshProfile,
    SshSpec, TransportPayload, Use, Variable, WebSocketSpec, Workflow, WorkflowStep,
};

use crate::args::{parse_duration, parse_kv_args};
use crate::regexes::{CAPTURE_ARGS_RE, DIRECTIVE_RE, HEADER_LINE_RE, REQUEST_LINE_RE, VARIABLE_LINE_RE};
use crate::workflow_frames::Frame;

const KNOWN_DIRECTIVES: &[&str] = &[
    "name",
    "description",
    "tag",
    "when",
    "capture",
    "assert",
    "apply",
    "use",
    "auth",
    "for-each",
    "foreach",
    "trace",
    "profile",
    "compare",
    "script",
    "ssh",
    "setting",
    "settings",
    "log-sensitive-headers",
    "workflow",
    "step",
    "if",
    "elif",
    "else",
    "switch",
    "case",
    "default",
    "grpc-service",
    "grpc-method",
    "grpc-proto",
    "grpc-reflection",
    "grpc-meta",
    "ws-subprotocol",
    "ws-step",
    "sse-reconnect",
];

struct ScriptBuf {
    kind: ScriptKind,
    lang: ScriptLang,
    lines: Vec<String>,
    file_ref: Option<String>,
}

#[derive(Default)]
struct PendingBody {
    lines: Vec<String>,
    started: bool,
}

pub struct Parser {
    doc: Document,
    pending_request: Option<Request>,
    pending_workflow: Option<Workflow>,
    workflow_stack: Vec<Frame>,
    headers_open: bool,
    body: PendingBody,
    script_buf: Option<ScriptBuf>,
    in_block_comment: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            doc: Document::default(),
            pending_request: None,
            pending_workflow: None,
            workflow_stack: Vec::new(),
            headers_open: false,
            body: PendingBody::default(),
            script_buf: None,
            in_block_comment: false,
        }
    }

    fn push_error(&mut self, line: usize, message: impl Into<String>) {
        self.doc.errors.push(ParseError::new(line, message));
    }

    /// The request metadata directives (`@name`, `@capture`, `@trace`, ...)
    /// attach to. Comment lines carrying these directives conventionally sit
    /// *above* the request line they describe, so when none is open yet (and
    /// we're not inside a `@workflow`) a placeholder with an empty URL is
    /// staged; `REQUEST_LINE_RE` fills it in rather than replacing it, and
    /// `flush_request` drops it if it never gets a URL.
    fn request_target(&mut self) -> Option<&mut Request> {
        if self.pending_request.is_none() && self.pending_workflow.is_none() {
            self.pending_request = Some(Request::new(Method::Get, String::new(), 0));
        }
        self.pending_request.as_mut()
    }

    fn flush_script_buf(&mut self) {
        let Some(buf) = self.script_buf.take() else {
            return;
        };
        let source = match buf.file_ref {
            Some(path) => ScriptSource::File(path),
            None => ScriptSource::Inline(buf.lines.join("\n")),
        };
        let block = ScriptBlock {
            kind: buf.kind,
            lang: buf.lang,
            source,
            line: 0,
        };
        if let Some(req) = self.pending_request.as_mut() {
            req.metadata.scripts.push(block);
        }
    }

    fn flush_body(&mut self) {
        self.flush_script_buf();
        if !self.body.started {
            return;
        }
        let text = std::mem::take(&mut self.body.lines).join("\n");
        self.body.started = false;
        if let Some(req) = self.pending_request.as_mut() {
            if req.body.is_empty() {
                req.body = tr_document::BodySource::inline(text);
            }
        }
    }

    fn flush_workflow_stack(&mut self) {
        while let Some(frame) = self.workflow_stack.pop() {
            let step = frame.into_step();
            self.push_workflow_step(step);
        }
    }

    fn push_workflow_step(&mut self, step: WorkflowStep) {
        if let Some(frame) = self.workflow_stack.last_mut() {
            frame.active_branch_mut().push(step);
        } else if let Some(wf) = self.pending_workflow.as_mut() {
            wf.steps.push(step);
        }
    }

    fn flush_request(&mut self) {
        self.flush_body();
        if let Some(req) = self.pending_request.take() {
            if !req.url.is_empty() {
                self.doc.items.push(Item::Request(req));
            }
        }
        self.headers_open = false;
    }

    fn flush_workflow(&mut self) {
        self.flush_workflow_stack();
        if let Some(wf) = self.pending_workflow.take() {
            self.doc.items.push(Item::Workflow(wf));
        }
    }

    /// Runs the full line-driven state machine over `text`.
    pub fn run(mut self, text: &str) -> Document {
        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            self.feed_line(raw_line, line_no);
        }
        self.flush_request();
        self.flush_workflow();
        self.doc
    }

    fn feed_line(&mut self, raw_line: &str, line_no: usize) {
        if self.in_block_comment {
            if let Some(pos) = raw_line.find("*/") {
                self.in_block_comment = false;
                let rest = raw_line[pos + 2..].trim();
                if !rest.is_empty() {
                    self.process_comment_body(rest, line_no);
                }
            }
            return;
        }

        let trimmed = raw_line.trim();

        if let Some(after_open) = trimmed.strip_prefix("/*") {
            if let Some(pos) = after_open.find("*/") {
                let inner = after_open[..pos].trim();
                if !inner.is_empty() {
                    self.process_comment_body(inner, line_no);
                }
            } else {
                self.in_block_comment = true;
                let inner = after_open.trim();
                if !inner.is_empty() {
                    self.process_comment_body(inner, line_no);
                }
            }
            return;
        }

        if let Some(body) = strip_comment_prefix(trimmed) {
            self.process_comment_body(body, line_no);
            return;
        }

        // Bare `@...` lines (no comment marker) are how variable declarations
        // and directives are usually written at file scope and right above a
        // request; both forms funnel through the same dispatch.
        if trimmed.starts_with('@') && !(self.pending_request.is_some() && !self.headers_open) {
            self.process_comment_body(trimmed, line_no);
            return;
        }

        if !trimmed.is_empty() && trimmed.chars().all(|c| c == '#') && trimmed.len() >= 3 {
            self.flush_request();
            self.flush_workflow();
            return;
        }

        if trimmed.is_empty() {
            if self.headers_open {
                self.headers_open = false;
            } else if self.script_buf.is_some() {
                self.flush_script_buf();
            } else if self.body.started {
                self.body.lines.push(String::new());
            }
            return;
        }

        if let Some(caps) = REQUEST_LINE_RE.captures(trimmed) {
            let method = Method::parse(&caps[1]).unwrap_or(Method::Get);
            let url = caps[2].to_string();

            // A placeholder staged by a preceding `@name`/`@capture`/... line
            // gets filled in rather than replaced, so that metadata survives.
            let staged = self
                .pending_request
                .as_ref()
                .is_some_and(|r| r.url.is_empty());
            if !staged {
                self.flush_request();
            }
            self.flush_workflow();

            let mut req = self
                .pending_request
                .take()
                .unwrap_or_else(|| Request::new(method, String::new(), line_no));
            req.method = method;
            req.url = url;
            req.line = line_no;
            if method.is_websocket() {
                req.transport = TransportPayload::WebSocket(WebSocketSpec::default());
            } else if matches!(method, Method::Grpc) {
                req.transport = TransportPayload::Grpc(GrpcRequest {
                    target: req.url.clone(),
                    full_method: None,
                    descriptor_path: None,
                    use_reflection: true,
                    metadata: tr_document::HeaderMultiMap::new(),
                    message_json: String::new(),
                    streaming: GrpcStreaming::Unary,
                });
            }
            self.pending_request = Some(req);
            self.headers_open = true;
            return;
        }

        if self.pending_request.is_some() && self.headers_open {
            if let Some(caps) = HEADER_LINE_RE.captures(trimmed) {
                let name = caps[1].to_string();
                let value = caps[2].to_string();
                self.pending_request.as_mut().unwrap().headers.push(name, value);
                return;
            }
            // No blank line separated headers from body; treat this line as
            // the start of the body instead of a malformed header.
            self.headers_open = false;
        }

        if self.pending_request.is_some() {
            self.feed_body_line(trimmed, raw_line, line_no);
            return;
        }

        // No active request/workflow and not a directive/comment: ignore
        // (blank structural noise between items).
    }

    fn feed_body_line(&mut self, trimmed: &str, raw_line: &str, line_no: usize) {
        if !self.body.started && self.body.lines.is_empty() && self.script_buf.is_none() {
            if let Some(path) = trimmed.strip_prefix('<') {
                let path = path.trim();
                self.pending_request.as_mut().unwrap().body = tr_document::BodySource::file(path);
                self.body.started = true;
                return;
            }
        }

        if let Some(rest) = trimmed.strip_prefix('>') {
            let content = rest.strip_prefix(' ').unwrap_or(rest);
            if self.script_buf.is_none() {
                self.script_buf = Some(ScriptBuf {
                    kind: ScriptKind::default(),
                    lang: ScriptLang::default(),
                    lines: Vec::new(),
                    file_ref: None,
                });
            }
            let buf = self.script_buf.as_mut().unwrap();
            if buf.lines.is_empty() && buf.file_ref.is_none() {
                if let Some(path) = content.trim_start().strip_prefix('<') {
                    buf.file_ref = Some(path.trim().to_string());
                    return;
                }
            }
            buf.lines.push(content.to_string());
            return;
        }

        self.flush_script_buf();
        self.body.started = true;
        self.body.lines.push(raw_line.to_string());
        let _ = line_no;
    }

    fn process_comment_body(&mut self, body: &str, line_no: usize) {
        let Some(caps) = DIRECTIVE_RE.captures(body) else {
            return;
        };
        let name_raw = caps[1].to_ascii_lowercase();
        let name = name_raw.as_str();
        let args = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

        if !KNOWN_DIRECTIVES.contains(&name) {
            if let Some(vcaps) = VARIABLE_LINE_RE.captures(body) {
                self.handle_variable(&vcaps, line_no);
            }
            return;
        }

        let flushes_stack = !matches!(
            name,
            "step" | "if" | "elif" | "else" | "switch" | "case" | "default" | "for-each" | "foreach"
        );
        if flushes_stack && !self.workflow_stack.is_empty() {
            self.flush_workflow_stack();
        }

        match name {
            "name" => self.set_name(args),
            "description" => self.set_description(args),
            "tag" => self.add_tags(args),
            "when" => self.set_when(args),
            "capture" => self.handle_capture(args, line_no),
            "assert" => self.handle_assert(args, line_no),
            "apply" => self.handle_apply(args, line_no),
            "use" => self.handle_use(args, line_no),
            "auth" => self.handle_auth(args),
            "for-each" | "foreach" => self.handle_for_each(args, line_no),
            "trace" => self.handle_trace(args),
            "profile" => self.handle_profile(args),
            "compare" => self.handle_compare(args),
            "script" => self.handle_script_directive(args),
            "ssh" => self.handle_ssh(args),
            "setting" | "settings" => self.handle_settings(args),
            "log-sensitive-headers" => {
                if let Some(req) = self.request_target() {
                    req.metadata.log_sensitive_headers = true;
                }
            }
            "workflow" => self.handle_workflow_start(args, line_no),
            "step" => self.handle_step(args, line_no),
            "if" => self.workflow_stack.push(Frame::new_if(args.to_string())),
            "elif" => self.handle_elif(args, line_no),
            "else" => self.handle_else(line_no),
            "switch" => self.workflow_stack.push(Frame::new_switch(args.to_string())),
            "case" => self.handle_case(args, line_no),
            "default" => self.handle_default(line_no),
            "grpc-service" | "grpc-method" => self.handle_grpc_method(args),
            "grpc-proto" => self.handle_grpc_proto(args),
            "grpc-reflection" => self.handle_grpc_reflection(args),
            "grpc-meta" => self.handle_grpc_meta(args),
            "ws-subprotocol" => self.handle_ws_subprotocol(args),
            "ws-step" => self.handle_ws_step(args, line_no),
            "sse-reconnect" => self.handle_sse_reconnect(args),
            _ => {}
        }
    }

    fn handle_variable(&mut self, caps: &regex::Captures, line_no: usize) {
        let scope = match caps.name("scope").map(|m| m.as_str()) {
            Some("global") => Scope::Global,
            Some("file") => Scope::File,
            Some("request") => Scope::Request,
            _ => {
                if self.pending_request.is_some() {
                    Scope::Request
                } else {
                    Scope::File
                }
            }
        };
        let secret = caps.name("secret").is_some();
        let name = caps["name"].to_string();
        let value = caps["value"].to_string();
        let var = Variable::new(name, value, line_no, scope, secret);
        match scope {
            Scope::Global => self.doc.global_variables.push(var),
            Scope::File => self.doc.file_variables.push(var),
            Scope::Request => {
                self.doc.request_variables.push(var.clone());
                if let Some(req) = self.pending_request.as_mut() {
                    req.variables.push(var);
                }
            }
        }
    }

    fn set_name(&mut self, args: &str) {
        let name = args.trim().to_string();
        if let Some(wf) = self.pending_workflow.as_mut() {
            wf.name = name;
        } else if let Some(req) = self.request_target() {
            req.metadata.name = Some(name);
        }
    }

    fn set_description(&mut self, args: &str) {
        let desc = args.trim().to_string();
        if let Some(wf) = self.pending_workflow.as_mut() {
            wf.description = Some(desc);
        } else if let Some(req) = self.request_target() {
            req.metadata.description = Some(desc);
        }
    }

    fn add_tags(&mut self, args: &str) {
        let (_, bare) = parse_kv_args(args);
        if let Some(wf) = self.pending_workflow.as_mut() {
            wf.tags.extend(bare);
        } else if let Some(req) = self.request_target() {
            req.metadata.tags.extend(bare);
        }
    }

    fn set_when(&mut self, args: &str) {
        let expr = args.trim().to_string();
        if let Some(req) = self.request_target() {
            req.metadata.when = Some(expr);
        }
    }

    fn handle_capture(&mut self, args: &str, line_no: usize) {
        let Some(caps) = CAPTURE_ARGS_RE.captures(args) else {
            self.push_error(line_no, format!("malformed @capture: {args}"));
            return;
        };
        let scope = match caps.name("scope").map(|m| m.as_str()) {
            Some("global") => Scope::Global,
            Some("file") => Scope::File,
            _ => Scope::Request,
        };
        let capture = Capture {
            scope,
            name: caps["name"].to_string(),
            expression: caps["expr"].trim().to_string(),
            secret: caps.name("secret").is_some(),
            line: line_no,
        };
        if let Some(req) = self.request_target() {
            req.metadata.captures.push(capture);
        }
    }

    fn handle_assert(&mut self, args: &str, line_no: usize) {
        let (expr, msg) = match args.split_once("=>") {
            Some((e, m)) => (e.trim().to_string(), Some(m.trim().to_string())),
            None => (args.trim().to_string(), None),
        };
        if let Some(req) = self.request_target() {
            req.metadata.asserts.push(Assert {
                expression: expr,
                message: msg,
                line: line_no,
            });
        }
    }

    fn handle_apply(&mut self, args: &str, line_no: usize) {
        if let Some(req) = self.request_target() {
            req.metadata.applies.push(Apply {
                name: args.trim().to_string(),
                line: line_no,
            });
        }
    }

    fn handle_use(&mut self, args: &str, line_no: usize) {
        let (path, alias) = match args.split_once(" as ") {
            Some((p, a)) => (p.trim().to_string(), a.trim().to_string()),
            None => (args.trim().to_string(), String::new()),
        };
        if let Some(req) = self.request_target() {
            req.metadata.uses.push(Use { path, alias, line: line_no });
        }
    }

    fn handle_auth(&mut self, args: &str) {
        let (kv, bare) = parse_kv_args(args);
        let kind = kv
            .get("type")
            .map(String::as_str)
            .or_else(|| bare.first().map(String::as_str))
            .unwrap_or("");
        let auth = match kind.to_ascii_lowercase().as_str() {
            "basic" => AuthSpec::Basic {
                username: kv.get("username").cloned().unwrap_or_default(),
                password: kv.get("password").cloned().unwrap_or_default(),
            },
            "bearer" => AuthSpec::Bearer {
                token: kv.get("token").cloned().unwrap_or_default(),
            },
            _ => AuthSpec::None,
        };
        if let Some(req) = self.request_target() {
            req.metadata.auth = auth;
        }
    }

    fn handle_for_each(&mut self, args: &str, line_no: usize) {
        let Some((var_name, collection_expr)) = args.split_once(" in ") else {
            self.push_error(line_no, format!("malformed @for-each: {args}"));
            return;
        };
        let spec = ForEachSpec {
            var_name: var_name.trim().to_string(),
            collection_expr: collection_expr.trim().to_string(),
        };
        if self.pending_workflow.is_some() {
            self.workflow_stack.push(Frame::new_for_each(spec));
        } else if let Some(req) = self.request_target() {
            req.metadata.for_each = Some(spec);
        }
    }

    fn handle_trace(&mut self, args: &str) {
        let (kv, _) = parse_kv_args(args);
        let Some(req) = self.request_target() else {
            return;
        };
        req.metadata.trace.enabled = true;
        if let Some(total) = kv.get("total").and_then(|s| parse_duration(s)) {
            req.metadata.trace.budgets.total = Some(total);
        }
        if let Some(tol) = kv.get("tolerance").and_then(|s| parse_duration(s)) {
            req.metadata.trace.budgets.tolerance = tol;
        }
        for kind in PhaseKind::ORDER {
            if let Some(d) = kv.get(kind.as_str()).and_then(|s| parse_duration(s)) {
                req.metadata.trace.budgets.phases.insert(kind, d);
            }
        }
    }

    fn handle_profile(&mut self, args: &str) {
        let (kv, _) = parse_kv_args(args);
        let mut spec = ProfileSpec::default();
        if let Some(c) = kv.get("count").and_then(|s| s.parse().ok()) {
            spec.count = c;
        }
        if let Some(w) = kv.get("warmup").and_then(|s| s.parse().ok()) {
            spec.warmup = w;
        }
        if let Some(d) = kv.get("delay").and_then(|s| parse_duration(s)) {
            spec.delay = d;
        }
        if let Some(req) = self.request_target() {
            req.metadata.profile = Some(spec);
        }
    }

    fn handle_compare(&mut self, args: &str) {
        let (kv, _) = parse_kv_args(args);
        let environments: Vec<String> = args
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.contains('='))
            .map(str::to_string)
            .collect();
        let baseline = kv
            .get("baseline")
            .cloned()
            .or_else(|| environments.first().cloned())
            .unwrap_or_default();
        if let Some(req) = self.request_target() {
            req.metadata.compare = Some(CompareSpec {
                environments,
                baseline,
            });
        }
    }

    fn handle_script_directive(&mut self, args: &str) {
        self.flush_script_buf();
        let mut parts = args.splitn(2, ',').map(str::trim);
        let kind = match parts.next().unwrap_or("") {
            "pre-request" | "prerequest" | "pre_request" => ScriptKind::PreRequest,
            _ => ScriptKind::Test,
        };
        let lang = match parts.next().unwrap_or("") {
            "rhai" => ScriptLang::Rhai,
            _ => ScriptLang::Js,
        };
        self.script_buf = Some(ScriptBuf {
            kind,
            lang,
            lines: Vec::new(),
            file_ref: None,
        });
    }

    fn handle_ssh(&mut self, args: &str) {
        let (kv, bare) = parse_kv_args(args);
        let spec = if kv.is_empty() {
            SshSpec::Named(bare.first().cloned().unwrap_or_default())
        } else {
            SshSpec::Inline(SshProfile {
                name: kv.get("name").cloned().unwrap_or_default(),
                host: kv.get("host").cloned().unwrap_or_default(),
                port: kv.get("port").and_then(|s| s.parse().ok()).unwrap_or(22),
                user: kv.get("user").cloned().unwrap_or_default(),
                identity_file: kv.get("identity").cloned(),
                local_port: kv.get("local-port").and_then(|s| s.parse().ok()).unwrap_or(0),
                remote_host: kv.get("remote-host").cloned().unwrap_or_default(),
                remote_port: kv.get("remote-port").and_then(|s| s.parse().ok()).unwrap_or(0),
            })
        };
        if let Some(req) = self.request_target() {
            req.metadata.ssh = Some(spec);
        }
    }

    /// `@setting`/`@settings` applies to the enclosing request when one is
    /// already open; otherwise it's a file-scope setting. Unlike the other
    /// request metadata directives, this one does NOT stage a placeholder
    /// request, since it's routinely declared at the top of a file with no
    /// request in sight.
    fn handle_settings(&mut self, args: &str) {
        let (kv, _) = parse_kv_args(args);
        if let Some(req) = self.pending_request.as_mut() {
            for (k, v) in kv {
                req.settings.set(k, v);
            }
        } else {
            for (k, v) in kv {
                self.doc.settings.set(k, v);
            }
        }
    }

    fn handle_workflow_start(&mut self, args: &str, line_no: usize) {
        self.flush_request();
        self.flush_workflow();
        self.pending_workflow = Some(Workflow {
            name: args.trim().to_string(),
            description: None,
            tags: Vec::new(),
            options: Default::default(),
            on_failure: OnFailure::default(),
            steps: Vec::new(),
            line: line_no,
        });
    }

    fn handle_step(&mut self, args: &str, line_no: usize) {
        if self.pending_workflow.is_none() {
            self.push_error(line_no, "@step outside of @workflow");
            return;
        }
        let (kv, bare) = parse_kv_args(args);
        let using = kv
            .get("using")
            .cloned()
            .or_else(|| bare.first().cloned())
            .unwrap_or_default();
        let on_failure = match kv.get("on-failure").map(String::as_str) {
            Some("continue") => OnFailure::Continue,
            _ => OnFailure::Stop,
        };
        let mut expect = ExpectSpec::default();
        if let Some(status) = kv.get("status").and_then(|s| s.parse().ok()) {
            expect.status = Some(status);
        }
        let step = RequestStep {
            name: kv.get("name").cloned(),
            using,
            when: kv.get("when").cloned(),
            for_each: None,
            expect,
            vars: kv,
            on_failure,
        };
        self.push_workflow_step(WorkflowStep::Request(step));
    }

    fn handle_elif(&mut self, args: &str, line_no: usize) {
        match self.workflow_stack.last_mut() {
            Some(frame) if frame.is_if() => {
                frame.add_elif(args.to_string());
            }
            _ => self.push_error(line_no, "@elif without a matching @if"),
        }
    }

    fn handle_else(&mut self, line_no: usize) {
        match self.workflow_stack.last_mut() {
            Some(frame) if frame.is_if() => {
                frame.enter_else();
            }
            _ => self.push_error(line_no, "@else without a matching @if"),
        }
    }

    fn handle_case(&mut self, args: &str, line_no: usize) {
        match self.workflow_stack.last_mut() {
            Some(frame) if frame.is_switch() => {
                frame.add_case(args.trim().to_string());
            }
            _ => self.push_error(line_no, "@case without a matching @switch"),
        }
    }

    fn handle_default(&mut self, line_no: usize) {
        match self.workflow_stack.last_mut() {
            Some(frame) if frame.is_switch() => {
                frame.enter_default();
            }
            _ => self.push_error(line_no, "@default without a matching @switch"),
        }
    }

    fn handle_grpc_method(&mut self, args: &str) {
        if let Some(Request {
            transport: TransportPayload::Grpc(g),
            ..
        }) = self.pending_request.as_mut()
        {
            g.full_method = Some(args.trim().to_string());
        }
    }

    fn handle_grpc_proto(&mut self, args: &str) {
        if let Some(Request {
            transport: TransportPayload::Grpc(g),
            ..
        }) = self.pending_request.as_mut()
        {
            g.descriptor_path = Some(args.trim().to_string());
            g.use_reflection = false;
        }
    }

    fn handle_grpc_reflection(&mut self, args: &str) {
        if let Some(Request {
            transport: TransportPayload::Grpc(g),
            ..
        }) = self.pending_request.as_mut()
        {
            g.use_reflection = !matches!(args.trim(), "false" | "off" | "0");
        }
    }

    fn handle_grpc_meta(&mut self, args: &str) {
        if let Some((name, value)) = args.split_once(':').or_else(|| args.split_once('=')) {
            if let Some(Request {
                transport: TransportPayload::Grpc(g),
                ..
            }) = self.pending_request.as_mut()
            {
                g.metadata.push(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    fn handle_ws_subprotocol(&mut self, args: &str) {
        if let Some(Request {
            transport: TransportPayload::WebSocket(ws),
            ..
        }) = self.pending_request.as_mut()
        {
            ws.subprotocols.push(args.trim().to_string());
        }
    }

    fn handle_ws_step(&mut self, args: &str, line_no: usize) {
        let (kv, bare) = parse_kv_args(args);
        let kind = bare.first().map(String::as_str).unwrap_or("");
        let step = match kind {
            "send" => tr_document::WsStep::Send(kv.get("text").cloned().unwrap_or_default()),
            "send-json" => match kv.get("json").map(|s| serde_json::from_str(s)) {
                Some(Ok(v)) => tr_document::WsStep::SendJson(v),
                _ => {
                    self.push_error(line_no, "malformed @ws-step send-json payload");
                    return;
                }
            },
            "send-base64" => tr_document::WsStep::SendBase64(kv.get("data").cloned().unwrap_or_default()),
            "send-file" => tr_document::WsStep::SendFile(kv.get("path").cloned().unwrap_or_default()),
            "ping" => tr_document::WsStep::Ping,
            "pong" => tr_document::WsStep::Pong,
            "wait" => {
                let dur = kv
                    .get("for")
                    .and_then(|s| parse_duration(s))
                    .unwrap_or(Duration::from_millis(0));
                tr_document::WsStep::Wait(dur)
            }
            "close" => tr_document::WsStep::Close {
                code: kv.get("code").and_then(|s| s.parse().ok()).unwrap_or(1000),
                reason: kv.get("reason").cloned().unwrap_or_default(),
            },
            other => {
                self.push_error(line_no, format!("unknown @ws-step kind: {other}"));
                return;
            }
        };
        if let Some(Request {
            transport: TransportPayload::WebSocket(ws),
            ..
        }) = self.pending_request.as_mut()
        {
            ws.steps.push(step);
        }
    }

    fn handle_sse_reconnect(&mut self, args: &str) {
        let (kv, _) = parse_kv_args(args);
        if let Some(Request {
            transport: TransportPayload::Sse(sse),
            ..
        }) = self.pending_request.as_mut()
        {
            if let Some(max) = kv.get("max").and_then(|s| s.parse().ok()) {
                sse.max_reconnects = max;
            }
        } else if let Some(req) = self.pending_request.as_mut() {
            let mut sse = SseSpec::default();
            if let Some(max) = kv.get("max").and_then(|s| s.parse().ok()) {
                sse.max_reconnects = max;
            }
            req.transport = TransportPayload::Sse(sse);
        }
    }
}

fn strip_comment_prefix(trimmed: &str) -> Option<&str> {
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(rest.trim());
    }
    if let Some(rest) = trimmed.strip_prefix("--") {
        return Some(rest.trim());
    }
    if trimmed.starts_with('#') && !trimmed.chars().all(|c| c == '#') {
        return Some(trimmed[1..].trim());
    }
    None
}
