use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rhai::{Engine, Scope};
use tokio_util::sync::CancellationToken;
use tr_document::{ScriptBlock, ScriptKind, ScriptSource};

use crate::api;
use crate::error::ScriptError;
use crate::state::{ScriptState, SharedState};

/// Every N evaluated operations the engine checks `cancel` — frequent
/// enough that a cancelled workflow notices within a few milliseconds,
/// coarse enough not to measurably slow a passing script down.
const PROGRESS_CHECK_GRANULARITY: u64 = 512;

/// Runs `@test`/`@pre-request` Rhai blocks against a request/response pair
/// (spec §4.7). One `ScriptsHost` is cheap to construct per request; it
/// holds no state of its own beyond engine configuration.
pub struct ScriptsHost {
    timeout: std::time::Duration,
}

impl ScriptsHost {
    pub fn new(timeout: std::time::Duration) -> Self {
        Self { timeout }
    }

    fn build_engine(&self, state: SharedState, cancel: CancellationToken) -> Engine {
        let mut engine = Engine::new();
        engine.set_max_operations(10_000_000);
        let counter = Arc::new(AtomicU64::new(0));
        engine.on_progress(move |_ops| {
            let n = counter.fetch_add(1, Ordering::Relaxed);
            if n % PROGRESS_CHECK_GRANULARITY == 0 && cancel.is_cancelled() {
                return Some(rhai::Dynamic::from("cancelled".to_string()));
            }
            None
        });
        api::register(&mut engine, state);
        engine
    }

    /// Runs every `PreRequest`-kind block in `scripts`, in document order,
    /// against `state`, allowing each to mutate the outgoing request.
    pub fn run_pre_request(
        &self,
        scripts: &[ScriptBlock],
        state: ScriptState,
        cancel: CancellationToken,
    ) -> Result<ScriptState, ScriptError> {
        self.run_kind(scripts, ScriptKind::PreRequest, state, cancel)
    }

    /// Runs every `Test`-kind block, letting each append to `test_results`.
    pub fn run_test(
        &self,
        scripts: &[ScriptBlock],
        state: ScriptState,
        cancel: CancellationToken,
    ) -> Result<ScriptState, ScriptError> {
        self.run_kind(scripts, ScriptKind::Test, state, cancel)
    }

    fn run_kind(
        &self,
        scripts: &[ScriptBlock],
        kind: ScriptKind,
        state: ScriptState,
        cancel: CancellationToken,
    ) -> Result<ScriptState, ScriptError> {
        let shared = SharedState::new(state);
        let engine = self.build_engine(shared.clone(), cancel.clone());

        for block in scripts.iter().filter(|b| b.kind == kind) {
            if cancel.is_cancelled() {
                return Err(ScriptError::Cancelled);
            }
            let source = match &block.source {
                ScriptSource::Inline(text) => text.clone(),
                ScriptSource::File(path) => {
                    std::fs::read_to_string(path).map_err(|e| ScriptError::Io(path.clone(), e.to_string()))?
                }
            };
            let mut scope = Scope::new();
            let result = engine.run_with_scope(&mut scope, &source);
            if let Err(err) = result {
                if matches!(&*err, rhai::EvalAltResult::ErrorTerminated(v, _) if v.clone().into_string().ok().as_deref() == Some("cancelled"))
                {
                    return Err(ScriptError::Cancelled);
                }
                return Err(ScriptError::Eval(block.line, err.to_string()));
            }
        }

        Ok(shared.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tr_document::ScriptLang;

    fn block(src: &str, kind: ScriptKind) -> ScriptBlock {
        ScriptBlock {
            kind,
            lang: ScriptLang::Rhai,
            source: ScriptSource::Inline(src.to_string()),
            line: 1,
        }
    }

    #[test]
    fn pre_request_script_can_rewrite_the_url() {
        let host = ScriptsHost::new(std::time::Duration::from_secs(1));
        let scripts = vec![block(r#"set_request_url("https://rewritten.test/x");"#, ScriptKind::PreRequest)];
        let state = ScriptState {
            request_url: "https://original.test".to_string(),
            ..Default::default()
        };
        let out = host.run_pre_request(&scripts, state, CancellationToken::new()).unwrap();
        assert_eq!(out.request_url, "https://rewritten.test/x");
    }

    #[test]
    fn test_script_records_pass_and_fail() {
        let host = ScriptsHost::new(std::time::Duration::from_secs(1));
        let scripts = vec![block(
            r#"test("status is 200", response_status() == 200); test("has header", get_header("x") != "");"#,
            ScriptKind::Test,
        )];
        let mut state = ScriptState::default();
        state.response_status = Some(200);
        let out = host.run_test(&scripts, state, CancellationToken::new()).unwrap();
        assert_eq!(out.test_results.len(), 2);
        assert!(out.test_results[0].passed);
        assert!(!out.test_results[1].passed);
    }

    #[test]
    fn set_var_is_visible_in_returned_state() {
        let host = ScriptsHost::new(std::time::Duration::from_secs(1));
        let scripts = vec![block(r#"set_var("token", "abc123");"#, ScriptKind::PreRequest)];
        let out = host.run_pre_request(&scripts, ScriptState::default(), CancellationToken::new()).unwrap();
        assert_eq!(out.variables.get("token").unwrap().0, "abc123");
    }

    #[test]
    fn already_cancelled_token_short_circuits_before_running() {
        let host = ScriptsHost::new(std::time::Duration::from_secs(1));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let scripts = vec![block(r#"set_var("x", "y");"#, ScriptKind::PreRequest)];
        let err = host.run_pre_request(&scripts, ScriptState::default(), cancel).unwrap_err();
        assert!(matches!(err, ScriptError::Cancelled));
    }
}
