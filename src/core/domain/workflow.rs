//! Workflow projections returned to callers.

use serde::{Deserialize, Serialize};

use crate::core::types::WorkflowName;

/// Status of one workflow.
///
/// Timestamps are unix seconds rendered as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub name: WorkflowName,
    /// Lower-cased engine phase (`pending`, `running`, `succeeded`, ...).
    pub status: String,
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<String>,
}

impl WorkflowStatus {
    /// True while the engine may still produce log output.
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_str(), "running" | "pending" | "")
    }
}

/// Collected log lines, each `"<pod>: <content>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowLogs {
    pub logs: Vec<String>,
}

/// One log line from a pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub pod_name: String,
    pub content: String,
}

impl std::fmt::Display for LogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.pod_name, self.content)
    }
}
