use serde::{Deserialize, Serialize};

use crate::constants::Constant;
use crate::request::Request;
use crate::settings::Settings;
use crate::ssh::SshProfile;
use crate::variable::Variable;
use crate::workflow::Workflow;

/// A single parse-time defect. Parsing never throws — every malformed
/// construct becomes one of these, attached to the `Document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Request(Request),
    Workflow(Workflow),
}

/// Immutable once parsing completes; consumers (resolver, orchestrator) only
/// ever read from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub items: Vec<Item>,
    pub global_variables: Vec<Variable>,
    pub file_variables: Vec<Variable>,
    /// Request-scope variables declared anywhere in the document, aggregated
    /// here for inspection; the authoritative per-request copy lives on each
    /// `Request.variables`.
    pub request_variables: Vec<Variable>,
    pub constants: Vec<Constant>,
    pub ssh_profiles: Vec<SshProfile>,
    pub settings: Settings,
    pub errors: Vec<ParseError>,
}

impl Document {
    pub fn requests(&self) -> impl Iterator<Item = &Request> {
        self.items.iter().filter_map(|i| match i {
            Item::Request(r) => Some(r),
            Item::Workflow(_) => None,
        })
    }

    pub fn workflows(&self) -> impl Iterator<Item = &Workflow> {
        self.items.iter().filter_map(|i| match i {
            Item::Workflow(w) => Some(w),
            Item::Request(_) => None,
        })
    }

    pub fn find_request(&self, name: &str) -> Option<&Request> {
        self.requests().find(|r| r.name() == name)
    }

    pub fn find_workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows().find(|w| w.name == name)
    }
}
