//! Scripts Host (spec §4.7): runs `@pre-request`/`@test` Rhai blocks with a
//! small bound API over the current request/response/variables, with
//! cooperative cancellation so a runaway script can't hang a workflow.

mod api;
mod error;
mod host;
mod state;

pub use error::ScriptError;
pub use host::ScriptsHost;
pub use state::{ScriptState, SharedState, TestResult};
