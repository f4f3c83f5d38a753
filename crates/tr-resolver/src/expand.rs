//! `{{name|filter|filter:arg}}` template expansion over a `VarTable` (spec §4.2).

use crate::dynamic;
use crate::table::VarTable;

/// The result of expanding one piece of template text: the expanded string,
/// whether any secret-flagged variable contributed to it, and any non-fatal
/// warnings collected along the way (unknown names, unknown filters).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    pub secret: bool,
    pub warnings: Vec<String>,
}

/// Expands every `{{...}}` placeholder found in `input`. A placeholder whose
/// base name can't be resolved is left verbatim in the output (passthrough)
/// and a warning is recorded — the caller decides whether that's fatal.
pub fn expand(input: &str, vars: &VarTable) -> Expansion {
    let mut out = String::with_capacity(input.len());
    let mut secret = false;
    let mut warnings = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated placeholder: emit the rest verbatim.
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let raw = &after[..end];
        let (value, was_secret) = resolve_placeholder(raw, vars, &mut warnings);
        secret |= was_secret;
        out.push_str(&value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);

    Expansion {
        text: out,
        secret,
        warnings,
    }
}

/// Resolves one placeholder body (`name` plus zero or more `|filter` stages)
/// to its final text and whether it drew from a secret.
fn resolve_placeholder(raw: &str, vars: &VarTable, warnings: &mut Vec<String>) -> (String, bool) {
    let raw = raw.trim();
    let mut stages = raw.split('|').map(str::trim);
    let head = stages.next().unwrap_or("");

    let (mut value, mut secret) = lookup(head, vars, warnings);

    for filter in stages {
        match apply_filter(filter, &value) {
            Ok(v) => value = v,
            Err(msg) => warnings.push(msg),
        }
    }
    if head.starts_with('$') {
        // dynamic tokens are never treated as secret regardless of filters applied
        secret = false;
    }
    (value, secret)
}

fn lookup(head: &str, vars: &VarTable, warnings: &mut Vec<String>) -> (String, bool) {
    if let Some(body) = head.strip_prefix('$') {
        let mut parts = body.splitn(2, ':');
        let name = parts.next().unwrap_or("");
        let name = name.split('+').next().unwrap_or(name);
        let arg = body.strip_prefix(name).map(|a| a.trim_start_matches(':'));
        let arg = match arg {
            Some("") => None,
            other => other,
        };
        // `$timestamp+1h` carries its offset attached to the name rather than after a colon.
        let arg = if name == "timestamp" {
            body.strip_prefix("timestamp").filter(|s| !s.is_empty())
        } else {
            arg
        };
        return match dynamic::evaluate(name, arg) {
            Some(Ok(v)) => (v, false),
            Some(Err(e)) => {
                warnings.push(format!("${name}: {e}"));
                (format!("{{{{${head}}}}}"), false)
            }
            None => {
                warnings.push(format!("unknown dynamic token: ${name}"));
                (format!("{{{{${head}}}}}"), false)
            }
        };
    }

    match vars.get(head) {
        Some(slot) => (slot.value.clone(), slot.secret),
        None => {
            warnings.push(format!("unknown variable: {head}"));
            (format!("{{{{{head}}}}}"), false)
        }
    }
}

fn apply_filter(filter: &str, value: &str) -> Result<String, String> {
    let (name, arg) = filter.split_once(':').map_or((filter, None), |(n, a)| (n, Some(a)));
    match name {
        "upper" => Ok(value.to_uppercase()),
        "lower" => Ok(value.to_lowercase()),
        "trim" => Ok(value.trim().to_string()),
        "default" => Ok(if value.is_empty() {
            arg.unwrap_or_default().to_string()
        } else {
            value.to_string()
        }),
        "json" => serde_json::to_string(value).map_err(|e| format!("json filter: {e}")),
        other => Err(format!("unknown filter: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tr_document::{Document, Request, Variable, Scope, Method};
    use std::collections::HashMap;

    fn table_with(vars: &[(&str, &str, bool)]) -> VarTable {
        let mut doc = Document::default();
        for (name, value, secret) in vars {
            doc.file_variables.push(Variable::new(*name, *value, 1, Scope::File, *secret));
        }
        let req = Request::new(Method::Get, "https://x", 1);
        VarTable::build(&doc, &req, &HashMap::new())
    }

    #[test]
    fn expands_known_variable() {
        let t = table_with(&[("name", "world", false)]);
        let e = expand("hello {{name}}", &t);
        assert_eq!(e.text, "hello world");
        assert!(e.warnings.is_empty());
        assert!(!e.secret);
    }

    #[test]
    fn unknown_name_passes_through_with_warning() {
        let t = table_with(&[]);
        let e = expand("{{missing}}", &t);
        assert_eq!(e.text, "{{missing}}");
        assert_eq!(e.warnings.len(), 1);
    }

    #[test]
    fn secret_propagates_through_filters() {
        let t = table_with(&[("token", "abc", true)]);
        let e = expand("Bearer {{token|upper}}", &t);
        assert_eq!(e.text, "Bearer ABC");
        assert!(e.secret);
    }

    #[test]
    fn default_filter_fills_empty_value() {
        let t = table_with(&[("empty", "", false)]);
        let e = expand("{{empty|default:fallback}}", &t);
        assert_eq!(e.text, "fallback");
    }

    #[test]
    fn dynamic_uuid_token_expands_and_is_never_secret() {
        let t = table_with(&[]);
        let e = expand("id={{$uuid}}", &t);
        assert!(e.text.starts_with("id="));
        assert!(!e.secret);
        assert!(e.warnings.is_empty());
    }

    #[test]
    fn unknown_filter_is_warned_and_passthrough_value_kept() {
        let t = table_with(&[("x", "v", false)]);
        let e = expand("{{x|frobnicate}}", &t);
        assert_eq!(e.text, "v");
        assert_eq!(e.warnings.len(), 1);
    }
}
