//! Transport Executors (spec §4.5): one executor per wire protocol the
//! document model can describe — plain HTTP, dynamic gRPC, Server-Sent
//! Events, and WebSocket — behind a common request/response shape so
//! `tr-orchestrator` doesn't need to know which one it's driving.

mod common;
mod error;
pub mod grpc;
pub mod http;
pub mod sse;
pub mod ws;

pub use common::{validate_headers, ExecRequest};
pub use error::TransportError;
pub use grpc::GrpcExecutor;
pub use http::HttpExecutor;
pub use sse::SseExecutor;
pub use ws::{WsExecutor, WsHandle};
