use serde::{Deserialize, Serialize};

/// A document-level constant (lowest precedence source in resolution).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub value: String,
    pub line: usize,
}
