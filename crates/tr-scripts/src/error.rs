#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("script at line {0}: {1}")]
    Eval(usize, String),
    #[error("reading script file {0}: {1}")]
    Io(String, String),
    #[error("script cancelled")]
    Cancelled,
}
