use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    PreRequest,
    Test,
}

impl Default for ScriptKind {
    fn default() -> Self {
        ScriptKind::Test
    }
}

/// The scripting language requested for a block. `Js` is accepted by the
/// parser/model (for round-tripping documents authored against richer
/// hosts) even though only `Rhai` is actually executable by this core's
/// Scripts Host; see `tr-scripts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptLang {
    Js,
    Rhai,
}

impl Default for ScriptLang {
    fn default() -> Self {
        ScriptLang::Js
    }
}

/// Inline or file-referenced script source, with declared (kind, lang).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBlock {
    pub kind: ScriptKind,
    pub lang: ScriptLang,
    pub source: ScriptSource,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptSource {
    Inline(String),
    File(String),
}
