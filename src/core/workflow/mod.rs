//! Workflow submission and observation.
//!
//! Jobs run on an Argo Workflows-compatible engine. This module owns the
//! engine seam, the parameter contract passed to workflow templates and the
//! cancellation handle used by log tails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::constants::{PARAM_EXECUTE_IMAGE, PARAM_PRE_IMAGE};
use crate::core::domain::{CredentialToken, LogEvent, WorkflowLogs, WorkflowRequest, WorkflowStatus};
use crate::core::types::{StringMap, WorkflowName};
use crate::error::{Result, SubmissionError};

mod argo;

pub use argo::ArgoWorkflow;

/// Receives log events as they arrive. An error stops the tail.
pub type LogSink<'a> = dyn FnMut(LogEvent) -> Result<()> + 'a;

/// Operations on the workflow engine.
pub trait WorkflowEngine: Send + Sync {
    /// Submit a run of `template_ref` (`kind/name`).
    ///
    /// # Returns
    ///
    /// The engine-assigned workflow name, lower-cased.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::MalformedTemplateRef` before any network
    /// call if the reference does not split into two non-empty parts.
    fn submit(
        &self,
        template_ref: &str,
        parameters: &StringMap,
        labels: &StringMap,
    ) -> Result<WorkflowName>;

    fn status(&self, name: &str) -> Result<WorkflowStatus>;

    /// Collect the main container's logs so far.
    fn logs(&self, name: &str) -> Result<WorkflowLogs>;

    /// Status of every workflow in the namespace.
    fn list(&self) -> Result<Vec<WorkflowStatus>>;

    /// Tail logs into `sink` until the workflow finishes or `cancel` is set.
    fn log_stream(&self, name: &str, cancel: &CancelToken, sink: &mut LogSink<'_>) -> Result<()>;
}

/// A parsed `kind/name` template reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateRef<'a> {
    pub kind: &'a str,
    pub name: &'a str,
}

impl<'a> TemplateRef<'a> {
    /// Split on the first `/`; both parts must be non-empty.
    pub fn parse(s: &'a str) -> Result<Self> {
        match s.split_once('/') {
            Some((kind, name)) if !kind.is_empty() && !name.is_empty() => Ok(Self { kind, name }),
            _ => Err(SubmissionError::MalformedTemplateRef(s.to_string()).into()),
        }
    }
}

/// Cooperative cancellation for long-lived tails.
///
/// Clones share the flag; set it from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Assemble the parameters every workflow template receives.
///
/// Only the image overrides are taken from the request's own parameters.
pub fn workflow_parameters(
    env_string: &str,
    command: &str,
    request: &WorkflowRequest,
    token: &CredentialToken,
) -> StringMap {
    let mut parameters = StringMap::new();
    parameters.insert("environment_variables_string".to_string(), env_string.to_string());
    parameters.insert("execute_command".to_string(), command.to_string());
    parameters.insert("project_name".to_string(), request.project_name.clone());
    parameters.insert("target_name".to_string(), request.target_name.clone());
    parameters.insert("credentials_token".to_string(), token.expose().to_string());
    parameters.insert("type".to_string(), request.operation.clone());

    for key in [PARAM_EXECUTE_IMAGE, PARAM_PRE_IMAGE] {
        if let Some(value) = request.parameters.get(key) {
            parameters.insert(key.to_string(), value.clone());
        }
    }
    parameters
}

/// Name prefix the engine extends into a workflow name.
pub fn generate_name(project: &str, target: &str) -> String {
    format!("{}-{}-", project, target)
}

/// Keep the workflows submitted for `project`/`target`.
pub fn filter_by_target(
    workflows: Vec<WorkflowStatus>,
    project: &str,
    target: &str,
) -> Vec<WorkflowStatus> {
    let prefix = generate_name(project, target);
    workflows
        .into_iter()
        .filter(|w| w.name.starts_with(&prefix))
        .collect()
}
