//! Immutable value types for the execution core's document model (spec §3).
//!
//! Everything here is data: no I/O, no parsing, no resolution logic. Those
//! live in `tr-parser` and `tr-resolver` respectively.

pub mod body;
pub mod capture_assert;
pub mod constants;
pub mod document;
pub mod profile_compare;
pub mod redact;
pub mod request;
pub mod response;
pub mod script;
pub mod settings;
pub mod sniff;
pub mod ssh;
pub mod trace;
pub mod variable;
pub mod workflow;

pub use body::{BodyContent, BodySource, GraphQlBody, GraphQlFileRef};
pub use capture_assert::{Apply, Assert, Capture, Use};
pub use constants::Constant;
pub use document::{Document, Item, ParseError};
pub use profile_compare::{CompareSpec, ProfileSpec};
pub use redact::Redacted;
pub use request::{
    AuthSpec, ForEachSpec, GrpcRequest, GrpcStreaming, Method, Request, RequestMetadata,
    SseSpec, TransportPayload, WebSocketSpec, WsStep,
};
pub use response::{HeaderMultiMap, Response, ResponseKind};
pub use script::{ScriptBlock, ScriptKind, ScriptLang, ScriptSource};
pub use settings::{RootCaMode, Settings};
pub use ssh::{SshProfile, SshSpec};
pub use trace::{Breach, BreachKind, Budgets, Phase, PhaseKind, PhaseMeta, Report, Timeline, TraceSpec};
pub use variable::{Scope, Variable};
pub use workflow::{
    ExpectSpec, ForEachStep, IfStep, OnFailure, RequestStep, SwitchCase, SwitchStep, Workflow,
    WorkflowStep,
};
