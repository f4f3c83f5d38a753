use std::collections::HashMap;

use tr_document::{Constant, Document, Request, Scope, Variable};

/// A single resolved variable slot: its value plus whether it (or any
/// narrower-scope variable of the same name it was layered over) was ever
/// declared secret. Secrecy only ever turns on, never off — §4.2 "secret
/// provenance" propagates via OR across the whole precedence chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub value: String,
    pub secret: bool,
}

/// The merged view of every variable visible to a single request, built by
/// layering constants < process < global < file < request (later layers
/// win the value, but never clear a `secret` flag set by an earlier one).
#[derive(Debug, Clone, Default)]
pub struct VarTable(HashMap<String, Slot>);

impl VarTable {
    fn layer(&mut self, vars: impl IntoIterator<Item = (String, String, bool)>) {
        for (name, value, secret) in vars {
            let was_secret = self.0.get(&name).is_some_and(|s| s.secret);
            self.0.insert(
                name,
                Slot {
                    value,
                    secret: secret || was_secret,
                },
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>, secret: bool) {
        self.layer([(name.into(), value.into(), secret)]);
    }

    /// Builds the table for one request: constants, then process-scope
    /// variables (handed in by the caller — §6's external Configuration
    /// collaborator, not something the document itself declares), then the
    /// document's global/file variables, then the request's own.
    pub fn build(doc: &Document, request: &Request, process_vars: &HashMap<String, String>) -> Self {
        let mut table = VarTable::default();
        table.layer(constants_as_tuples(&doc.constants));
        table.layer(
            process_vars
                .iter()
                .map(|(k, v)| (k.clone(), v.clone(), false)),
        );
        table.layer(variables_as_tuples(&doc.global_variables));
        table.layer(variables_as_tuples(&doc.file_variables));
        table.layer(variables_as_tuples(&request.variables));
        table
    }

    pub fn insert_scope(&mut self, scope: Scope, name: String, value: String, secret: bool) {
        let _ = scope; // resolution doesn't care where a capture lands, only that it's visible going forward
        self.layer([(name, value, secret)]);
    }
}

fn variables_as_tuples(vars: &[Variable]) -> impl Iterator<Item = (String, String, bool)> + '_ {
    vars.iter()
        .map(|v| (v.name.clone(), v.value.clone(), v.secret))
}

fn constants_as_tuples(consts: &[Constant]) -> impl Iterator<Item = (String, String, bool)> + '_ {
    consts.iter().map(|c| (c.name.clone(), c.value.clone(), false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layer_wins_value_but_secret_only_turns_on() {
        let mut t = VarTable::default();
        t.layer([("token".to_string(), "a".to_string(), true)]);
        t.layer([("token".to_string(), "b".to_string(), false)]);
        let slot = t.get("token").unwrap();
        assert_eq!(slot.value, "b");
        assert!(slot.secret, "secret flag must not be cleared by a later non-secret layer");
    }
}
