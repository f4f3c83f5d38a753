use rhai::{Engine, EvalAltResult};

use crate::state::{SharedState, TestResult};

/// Registers the request/response/variables/test bindings a pre-request or
/// test script sees, mirroring the small "request object with getters and
/// setters" surface most REST-client script hosts expose (Postman's `pm.*`,
/// Insomnia's `insomnia.*`) but scoped down to what this core's document
/// model actually carries.
pub fn register(engine: &mut Engine, state: SharedState) {
    let s = state.clone();
    engine.register_fn("request_url", move || s.0.lock().expect("poisoned").request_url.clone());

    let s = state.clone();
    engine.register_fn("set_request_url", move |url: String| {
        s.0.lock().expect("poisoned").request_url = url;
    });

    let s = state.clone();
    engine.register_fn("set_header", move |name: String, value: String| {
        let mut guard = s.0.lock().expect("poisoned");
        guard.request_headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        guard.request_headers.push((name, value));
    });

    let s = state.clone();
    engine.register_fn("get_header", move |name: String| -> String {
        s.0.lock()
            .expect("poisoned")
            .request_headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    });

    let s = state.clone();
    engine.register_fn("set_body", move |body: String| {
        s.0.lock().expect("poisoned").request_body = Some(body);
    });

    let s = state.clone();
    engine.register_fn("response_status", move || -> i64 {
        s.0.lock().expect("poisoned").response_status.unwrap_or_default() as i64
    });

    let s = state.clone();
    engine.register_fn("response_body", move || -> String {
        s.0.lock().expect("poisoned").response_body.clone().unwrap_or_default()
    });

    let s = state.clone();
    engine.register_fn("response_header", move |name: String| -> String {
        s.0.lock()
            .expect("poisoned")
            .response_headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    });

    let s = state.clone();
    engine.register_fn("response_json", move || -> rhai::Dynamic {
        let body = s.0.lock().expect("poisoned").response_body.clone().unwrap_or_default();
        serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| rhai::serde::to_dynamic(v).ok())
            .unwrap_or(rhai::Dynamic::UNIT)
    });

    let s = state.clone();
    engine.register_fn("get_var", move |name: String| -> String {
        s.0.lock()
            .expect("poisoned")
            .variables
            .get(&name)
            .map(|(v, _)| v.clone())
            .unwrap_or_default()
    });

    let s = state.clone();
    engine.register_fn("set_var", move |name: String, value: String| {
        s.0.lock().expect("poisoned").variables.insert(name, (value, false));
    });

    let s = state.clone();
    engine.register_fn("set_secret_var", move |name: String, value: String| {
        s.0.lock().expect("poisoned").variables.insert(name, (value, true));
    });

    let s = state.clone();
    engine.register_fn("log", move |message: String| {
        s.0.lock().expect("poisoned").logs.push(message);
    });

    let s = state.clone();
    engine.register_fn("test", move |name: String, passed: bool| {
        s.0.lock().expect("poisoned").test_results.push(TestResult {
            name,
            passed,
            message: None,
        });
    });

    let s = state;
    engine.register_fn("test_with_message", move |name: String, passed: bool, message: String| {
        s.0.lock().expect("poisoned").test_results.push(TestResult {
            name,
            passed,
            message: Some(message),
        });
    });
}

/// Wraps a user assertion expression failure into a script-level test
/// failure rather than letting the whole run abort, matching the teacher's
/// policy of treating domain failures as data rather than as exceptions.
pub fn record_eval_error(state: &SharedState, context: &str, err: &EvalAltResult) {
    state.0.lock().expect("poisoned").test_results.push(TestResult {
        name: context.to_string(),
        passed: false,
        message: Some(err.to_string()),
    });
}
