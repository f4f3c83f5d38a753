use serde::{Deserialize, Serialize};

/// A named SSH tunnel profile declared at file scope via `@ssh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshProfile {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub identity_file: Option<String>,
    pub local_port: u16,
    pub remote_host: String,
    pub remote_port: u16,
}

/// A request-scoped SSH reference: either a named file-scope profile, or an
/// inline spec that gets a fresh tunnel torn down on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SshSpec {
    Named(String),
    Inline(SshProfile),
}
