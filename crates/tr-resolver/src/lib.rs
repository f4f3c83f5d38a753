//! Variable Resolver (spec §4.2): merges variable scopes by precedence and
//! expands `{{...}}` templates, including dynamic `$`-tokens, over request
//! text before it reaches a transport executor.

mod dynamic;
mod expand;
mod table;

use std::collections::HashMap;

use tr_document::{Document, Request, Scope};

pub use expand::Expansion;
pub use table::{Slot, VarTable};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unresolved placeholders remain: {0:?}")]
    UnresolvedStrict(Vec<String>),
}

/// Expands a single piece of text against a variable table, returning the
/// expansion verbatim (passthrough + warnings, never an error) — callers
/// that need strict failure on unresolved names use [`expand_strict`].
pub fn expand(input: &str, vars: &VarTable) -> Expansion {
    expand::expand(input, vars)
}

/// Like [`expand`] but turns any "unknown variable" warning into a hard
/// error, for contexts where silent passthrough would be a footgun (e.g.
/// a URL or an auth header, per §4.2's strict-mode note).
pub fn expand_strict(input: &str, vars: &VarTable) -> Result<Expansion, ResolveError> {
    let expansion = expand::expand(input, vars);
    let unresolved: Vec<String> = expansion
        .warnings
        .iter()
        .filter(|w| w.starts_with("unknown variable: "))
        .cloned()
        .collect();
    if unresolved.is_empty() {
        Ok(expansion)
    } else {
        Err(ResolveError::UnresolvedStrict(unresolved))
    }
}

/// Builds the precedence-merged variable table for a single request: the
/// document's constants and global/file variables layered under the
/// request's own, with `process_vars` (externally supplied, e.g. from the
/// environment or a profile file) layered between constants and globals.
pub fn table_for(doc: &Document, request: &Request, process_vars: &HashMap<String, String>) -> VarTable {
    VarTable::build(doc, request, process_vars)
}

/// Fully resolves a request's URL, headers, and body text against `vars`,
/// returning the expanded strings plus whether any of them drew on a secret
/// value (for redaction at history/trace write time).
#[derive(Debug, Clone, Default)]
pub struct ResolvedRequest {
    pub url: String,
    pub headers: Vec<(String, String, bool)>,
    pub body: Option<String>,
    pub secret: bool,
    pub warnings: Vec<String>,
}

pub fn resolve_request(request: &Request, vars: &VarTable) -> ResolvedRequest {
    let mut out = ResolvedRequest::default();

    let url = expand::expand(&request.url, vars);
    out.secret |= url.secret;
    out.warnings.extend(url.warnings);
    out.url = url.text;

    for (name, value) in request.headers.iter() {
        let expansion = expand::expand(value, vars);
        out.secret |= expansion.secret;
        out.warnings.extend(expansion.warnings);
        out.headers.push((name.clone(), expansion.text, expansion.secret));
    }

    if request.body.expand_templates {
        if let tr_document::BodyContent::Inline(text) = &request.body.content {
            let expansion = expand::expand(text, vars);
            out.secret |= expansion.secret;
            out.warnings.extend(expansion.warnings);
            out.body = Some(expansion.text);
        }
    }

    out
}

/// Records a captured value back into a table at the given scope, so
/// subsequent requests in the same workflow see it (spec §4.6's capture
/// contract feeds the resolver through this single entry point).
pub fn capture_into(vars: &mut VarTable, scope: Scope, name: String, value: String, secret: bool) {
    vars.insert_scope(scope, name, value, secret);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tr_document::{Method, Variable};

    fn doc_with_request() -> (Document, Request) {
        let mut doc = Document::default();
        doc.global_variables.push(Variable::new("host", "api.example.com", 1, Scope::Global, false));
        doc.file_variables.push(Variable::new("token", "s3cr3t", 2, Scope::File, true));
        let mut req = Request::new(Method::Get, "https://{{host}}/items", 3);
        req.headers.push("Authorization", "Bearer {{token}}");
        (doc, req)
    }

    #[test]
    fn resolve_request_expands_url_and_marks_secret_header() {
        let (doc, req) = doc_with_request();
        let table = table_for(&doc, &req, &HashMap::new());
        let resolved = resolve_request(&req, &table);
        assert_eq!(resolved.url, "https://api.example.com/items");
        assert!(resolved.secret);
        let (_, value, secret) = &resolved.headers[0];
        assert_eq!(value, "Bearer s3cr3t");
        assert!(secret);
    }

    #[test]
    fn process_vars_sit_below_global_and_file() {
        let (mut doc, req) = doc_with_request();
        doc.global_variables.push(Variable::new("env_name", "from-global", 1, Scope::Global, false));
        let mut process_vars = HashMap::new();
        process_vars.insert("env_name".to_string(), "from-process".to_string());
        let table = table_for(&doc, &req, &process_vars);
        assert_eq!(table.get("env_name").unwrap().value, "from-global");
    }

    #[test]
    fn expand_strict_rejects_unknown_names() {
        let table = VarTable::default();
        let err = expand_strict("{{missing}}", &table).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedStrict(names) if names.len() == 1));
    }

    #[test]
    fn capture_into_makes_value_visible_to_later_expansion() {
        let mut table = VarTable::default();
        capture_into(&mut table, Scope::Request, "id".to_string(), "42".to_string(), false);
        let e = expand("item {{id}}", &table);
        assert_eq!(e.text, "item 42");
    }
}
