use serde::{Deserialize, Serialize};

/// Visibility scope of a `Variable`. Determines precedence during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Global,
    File,
    Request,
}

/// A single declared variable.
///
/// Invariants (enforced by the parser, not by this type):
/// - `name` matches `[A-Za-z0-9_.-]+`.
/// - Within the same scope, last declaration wins.
/// - A secret variable can never be demoted to non-secret by a later
///   assignment in a narrower or equal scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
    pub line: usize,
    pub scope: Scope,
    pub secret: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>, line: usize, scope: Scope, secret: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            line,
            scope,
            secret,
        }
    }
}

/// A name matches the variable/template identifier grammar.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_grammar_accepts_and_rejects() {
        assert!(is_valid_identifier("token"));
        assert!(is_valid_identifier("api.base-url_1"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("has space"));
        assert!(!is_valid_identifier("has{brace}"));
    }
}
