use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::request::ForEachSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    Stop,
    Continue,
}

impl Default for OnFailure {
    fn default() -> Self {
        OnFailure::Stop
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectSpec {
    pub status: Option<u32>,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStep {
    pub name: Option<String>,
    pub using: String,
    pub when: Option<String>,
    pub for_each: Option<ForEachSpec>,
    pub expect: ExpectSpec,
    pub vars: HashMap<String, String>,
    pub on_failure: OnFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfStep {
    pub cond: String,
    pub then_branch: Vec<WorkflowStep>,
    pub elif_branches: Vec<(String, Vec<WorkflowStep>)>,
    pub else_branch: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub value: String,
    pub body: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchStep {
    pub expr: String,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Vec<WorkflowStep>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForEachStep {
    pub for_each: ForEachSpec,
    pub body: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowStep {
    Request(RequestStep),
    If(IfStep),
    Switch(SwitchStep),
    ForEach(ForEachStep),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub options: HashMap<String, String>,
    pub on_failure: OnFailure,
    pub steps: Vec<WorkflowStep>,
    pub line: usize,
}
