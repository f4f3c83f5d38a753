use serde::{Deserialize, Serialize};

/// A GraphQL operation body, optionally carrying multipart file uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlBody {
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: Option<serde_json::Value>,
    /// Map from GraphQL multipart field name to a file path.
    #[serde(default)]
    pub files: Vec<GraphQlFileRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlFileRef {
    pub field: String,
    pub path: String,
}

/// The origin of a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyContent {
    Inline(String),
    File(String),
    GraphQl(GraphQlBody),
    Empty,
}

impl Default for BodyContent {
    fn default() -> Self {
        BodyContent::Empty
    }
}

/// A body source: its content plus MIME hint and template-expansion flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySource {
    pub content: BodyContent,
    pub mime_type: Option<String>,
    /// Whether `{{...}}` templates in this body should be expanded before send.
    pub expand_templates: bool,
}

impl BodySource {
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            content: BodyContent::Inline(text.into()),
            mime_type: None,
            expand_templates: true,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            content: BodyContent::File(path.into()),
            mime_type: None,
            expand_templates: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, BodyContent::Empty)
    }
}
