use serde::{Deserialize, Serialize};

use crate::variable::Scope;

/// `@capture {scope} name = expression`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub scope: Scope,
    pub name: String,
    pub expression: String,
    pub secret: bool,
    pub line: usize,
}

/// `@assert expr [=> message]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assert {
    pub expression: String,
    pub message: Option<String>,
    pub line: usize,
}

/// `@apply name` — named template/fragment application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apply {
    pub name: String,
    pub line: usize,
}

/// `@use path as alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Use {
    pub path: String,
    pub alias: String,
    pub line: usize,
}
