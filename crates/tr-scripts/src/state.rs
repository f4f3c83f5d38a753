use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mutable state a script can read and, for pre-request scripts, rewrite —
/// the request about to be sent or the response just received, plus the
/// variable table and whatever a prior capture/script has produced.
#[derive(Debug, Clone, Default)]
pub struct ScriptState {
    pub request_url: String,
    pub request_headers: Vec<(String, String)>,
    pub request_body: Option<String>,
    pub response_status: Option<u32>,
    pub response_headers: Vec<(String, String)>,
    pub response_body: Option<String>,
    pub variables: HashMap<String, (String, bool)>,
    pub test_results: Vec<TestResult>,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

/// Shared handle passed into the rhai engine; scripts only ever see this
/// through the bound API functions in [`crate::api`], never the struct
/// itself.
#[derive(Clone, Default)]
pub struct SharedState(pub Arc<Mutex<ScriptState>>);

impl SharedState {
    pub fn new(state: ScriptState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub fn into_inner(self) -> ScriptState {
        Arc::try_unwrap(self.0)
            .map(|m| m.into_inner().expect("script state lock poisoned"))
            .unwrap_or_else(|arc| arc.lock().expect("script state lock poisoned").clone())
    }
}
