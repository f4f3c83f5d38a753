use jsonpath_rust::JsonPathQuery;
use rhai::{Engine, Scope};

use crate::error::CoreError;

/// Evaluates a boolean expression (`@if`/`@when`/`@assert` condition text,
/// `@switch` case match) against the exchange context: `status` (int),
/// `body` (the parsed JSON response body, or unit if not JSON), and every
/// currently-resolved variable bound by name. Conditions use the same Rhai
/// expression syntax as scripts so authors only learn one language.
pub fn eval_bool(expr: &str, context: &serde_json::Value, vars: &[(String, String)]) -> Result<bool, CoreError> {
    let engine = Engine::new();
    let mut scope = bind_scope(context, vars);
    engine
        .eval_expression_with_scope::<bool>(&mut scope, expr)
        .map_err(|e| CoreError::Eval(expr.to_string(), e.to_string()))
}

/// Evaluates an arbitrary expression to a string, used for `@switch`'s
/// subject expression and for simple string-producing capture expressions
/// that aren't JSONPath (don't start with `$.`).
pub fn eval_string(expr: &str, context: &serde_json::Value, vars: &[(String, String)]) -> Result<String, CoreError> {
    let engine = Engine::new();
    let mut scope = bind_scope(context, vars);
    let value: rhai::Dynamic = engine
        .eval_expression_with_scope(&mut scope, expr)
        .map_err(|e| CoreError::Eval(expr.to_string(), e.to_string()))?;
    Ok(value.to_string())
}

fn bind_scope(context: &serde_json::Value, vars: &[(String, String)]) -> Scope<'static> {
    let mut scope = Scope::new();
    if let Some(status) = context.get("status").and_then(serde_json::Value::as_i64) {
        scope.push("status", status);
    }
    if let Some(body) = context.get("body") {
        if let Ok(dynamic) = rhai::serde::to_dynamic(body.clone()) {
            scope.push("body", dynamic);
        }
    }
    for (name, value) in vars {
        scope.push(name.clone(), value.clone());
    }
    scope
}

/// Extracts a captured value from the exchange context via JSONPath
/// (`$.body.token`, `$.headers["x-request-id"]`, `$.status`).
pub fn eval_capture(expression: &str, context: &serde_json::Value) -> Result<serde_json::Value, CoreError> {
    let results = context
        .clone()
        .path(expression)
        .map_err(|e| CoreError::CaptureMiss(expression.to_string(), e.to_string()))?;
    match results {
        serde_json::Value::Array(items) if items.len() == 1 => Ok(items.into_iter().next().unwrap()),
        serde_json::Value::Array(items) if items.is_empty() => {
            Err(CoreError::CaptureMiss(expression.to_string(), "no match".to_string()))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> serde_json::Value {
        serde_json::json!({
            "status": 200,
            "body": { "token": "abc123", "user": { "id": 7 } },
        })
    }

    #[test]
    fn eval_bool_reads_status_from_context() {
        assert!(eval_bool("status == 200", &context(), &[]).unwrap());
        assert!(!eval_bool("status == 404", &context(), &[]).unwrap());
    }

    #[test]
    fn eval_capture_extracts_nested_field_via_jsonpath() {
        let value = eval_capture("$.body.user.id", &context()).unwrap();
        assert_eq!(value, serde_json::json!(7));
    }

    #[test]
    fn eval_capture_errors_on_no_match() {
        assert!(eval_capture("$.body.missing", &context()).is_err());
    }

    #[test]
    fn eval_bool_sees_bound_variables() {
        let vars = vec![("env".to_string(), "staging".to_string())];
        assert!(eval_bool(r#"env == "staging""#, &context(), &vars).unwrap());
    }
}
