//! Workflow commands.

use std::io::{self, Read, Write};
use std::path::Path;

use serde_json::json;
use tracing::{debug, warn};

use crate::cli::output;
use crate::core::domain::{GitWorkflowRequest, LogEvent, WorkflowRequest};
use crate::core::orchestrator::Orchestrator;
use crate::core::workflow::CancelToken;
use crate::error::Result;

/// Cancel `token` on the first Ctrl-C and exit on the second.
///
/// The listener runs on its own thread with a current-thread runtime; the
/// tail keeps blocking on the engine until its next read returns.
fn cancel_on_interrupt(token: CancelToken) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "failed to start signal listener");
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to install Ctrl-C handler");
                return;
            }
            token.cancel();
            output::dimmed("stopping after the current read, press Ctrl-C again to quit");

            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    });
}

/// A fresh trace id for the `x-b3-traceid` label.
fn trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn read_request(path: &Path) -> Result<WorkflowRequest> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&contents)?)
}

/// Submit a JSON workflow request.
pub fn create(orchestrator: &Orchestrator, auth: &str, request: &Path) -> Result<()> {
    let request = read_request(request)?;
    let trace_id = trace_id();
    debug!(trace_id = %trace_id, "submitting workflow request");

    let name = orchestrator.create_workflow(auth, &request, &trace_id)?;
    output::json(&json!({ "workflow_name": name }))
}

/// Submit the manifest at a commit of the project's repository.
pub fn from_git(
    orchestrator: &Orchestrator,
    auth: &str,
    project: &str,
    request: GitWorkflowRequest,
) -> Result<()> {
    let trace_id = trace_id();
    debug!(trace_id = %trace_id, sha = %request.commit_hash, "submitting manifest");

    let name = orchestrator.create_workflow_from_git(auth, project, &request, &trace_id)?;
    output::json(&json!({ "workflow_name": name }))
}

pub fn status(orchestrator: &Orchestrator, name: &str) -> Result<()> {
    output::json(&orchestrator.workflow_status(name)?)
}

/// Print collected logs, or tail them with `follow`.
pub fn logs(orchestrator: &Orchestrator, name: &str, follow: bool) -> Result<()> {
    if !follow {
        let logs = orchestrator.workflow_logs(name)?;
        if logs.logs.is_empty() {
            output::dimmed("no logs yet");
        }
        for line in &logs.logs {
            println!("{}", line);
        }
        return Ok(());
    }

    let cancel = CancelToken::new();
    cancel_on_interrupt(cancel.clone());

    let stdout = io::stdout();
    let mut sink = |event: LogEvent| -> Result<()> {
        let mut out = stdout.lock();
        writeln!(out, "{}", event)?;
        out.flush()?;
        Ok(())
    };
    orchestrator.stream_workflow_logs(name, &cancel, &mut sink)
}

pub fn list(orchestrator: &Orchestrator, project: &str, target: &str) -> Result<()> {
    let workflows = orchestrator.list_workflows(project, target)?;
    if workflows.is_empty() {
        output::dimmed(&format!("no workflows for {}/{}", project, target));
    }
    output::json(&workflows)
}
