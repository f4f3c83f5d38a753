//! In-process mock HTTP and WebSocket servers used by transport and
//! orchestrator tests, so those tests don't depend on network access or a
//! real upstream service.

mod http_server;
mod ws_server;

pub use http_server::MockHttpServer;
pub use ws_server::MockWsServer;
