//! Orchestrator (spec §4.8): composes the resolver, transports, trace
//! recorder, scripts host, stream registry, and history store into a single
//! pipeline that runs requests and workflows from a parsed `Document`.

mod compare;
mod error;
mod eval;
mod profile;
mod request_exec;
mod workflow_exec;

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tr_document::{Document, ProfileSpec};
use tr_history::HistoryStore;
use tr_resolver::VarTable;

pub use compare::{run_compare, CompareResult};
pub use error::{CoreError, ErrorKind};
pub use profile::{run_profile, ProfileStats};
pub use request_exec::{run_request, Executors, RequestOutcome};
pub use workflow_exec::{run_steps, StepOutcome};

/// Top-level entry point a host application drives: resolve a document's
/// items by name and execute them, with cancellation threaded through
/// every request and script so a UI "stop" button actually stops things.
pub struct Orchestrator {
    executors: Executors,
}

impl Orchestrator {
    pub fn new(history: Arc<dyn HistoryStore>) -> Result<Self, CoreError> {
        Ok(Self {
            executors: Executors::new(history)?,
        })
    }

    pub async fn run_request_by_name(
        &self,
        doc: &Document,
        name: &str,
        process_vars: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<RequestOutcome, CoreError> {
        let request = doc.find_request(name).ok_or_else(|| CoreError::UnknownRequest(name.to_string()))?;
        let mut vars = VarTable::default();
        run_request(&self.executors, doc, request, &mut vars, process_vars, cancel).await
    }

    pub async fn run_workflow_by_name(
        &self,
        doc: &Document,
        name: &str,
        process_vars: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<StepOutcome>, CoreError> {
        let workflow = doc
            .find_workflow(name)
            .ok_or_else(|| CoreError::UnknownRequest(name.to_string()))?;
        let mut vars = VarTable::default();
        let mut context = serde_json::Value::Null;
        let mut results = Vec::new();
        run_steps(
            &self.executors,
            doc,
            &workflow.steps,
            &mut vars,
            process_vars,
            &mut context,
            &mut results,
            cancel,
        )
        .await?;
        Ok(results)
    }

    pub async fn run_profile_by_name(
        &self,
        doc: &Document,
        name: &str,
        spec: &ProfileSpec,
        process_vars: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<ProfileStats, CoreError> {
        let request = doc.find_request(name).ok_or_else(|| CoreError::UnknownRequest(name.to_string()))?;
        run_profile(&self.executors, doc, request, spec, process_vars, cancel).await
    }

    pub async fn run_compare_by_name(
        &self,
        doc: &Document,
        name: &str,
        spec: &tr_document::CompareSpec,
        process_vars_by_env: &HashMap<String, HashMap<String, String>>,
        cancel: &CancellationToken,
    ) -> Result<Vec<CompareResult>, CoreError> {
        let request = doc.find_request(name).ok_or_else(|| CoreError::UnknownRequest(name.to_string()))?;
        run_compare(&self.executors, doc, request, spec, process_vars_by_env, cancel).await
    }
}
