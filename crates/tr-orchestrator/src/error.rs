/// The execution core's top-level error type. `.kind()` lets a host
/// application (CLI, UI) branch on category without matching every variant.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("resolving variables: {0}")]
    Resolve(#[from] tr_resolver::ResolveError),
    #[error("transport: {0}")]
    Transport(#[from] tr_transport::TransportError),
    #[error("script: {0}")]
    Script(#[from] tr_scripts::ScriptError),
    #[error("history: {0}")]
    History(#[from] tr_history::HistoryError),
    #[error("evaluating expression {0:?}: {1}")]
    Eval(String, String),
    #[error("capture {0:?} did not match: {1}")]
    CaptureMiss(String, String),
    #[error("assertion failed: {0}")]
    AssertFailed(String),
    #[error("request {0:?} referenced by workflow step not found")]
    UnknownRequest(String),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Resolve,
    Transport,
    Script,
    History,
    Eval,
    Capture,
    Assert,
    UnknownRequest,
    Cancelled,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Resolve(_) => ErrorKind::Resolve,
            CoreError::Transport(_) => ErrorKind::Transport,
            CoreError::Script(_) => ErrorKind::Script,
            CoreError::History(_) => ErrorKind::History,
            CoreError::Eval(..) => ErrorKind::Eval,
            CoreError::CaptureMiss(..) => ErrorKind::Capture,
            CoreError::AssertFailed(_) => ErrorKind::Assert,
            CoreError::UnknownRequest(_) => ErrorKind::UnknownRequest,
            CoreError::Cancelled => ErrorKind::Cancelled,
        }
    }
}
