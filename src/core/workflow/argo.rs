//! Argo Workflows server client.
//!
//! Talks to the server's REST API under `/api/v1/workflows/{namespace}`.
//! Log endpoints answer with newline-delimited JSON, one
//! `{"result": {"content", "podName"}}` object per line.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use chrono::DateTime;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, trace, warn};
use zeroize::Zeroizing;

use super::{generate_name, CancelToken, LogSink, TemplateRef, WorkflowEngine};
use crate::core::config::ArgoConfig;
use crate::core::constants::MAIN_CONTAINER;
use crate::core::domain::{LogEvent, WorkflowLogs, WorkflowStatus};
use crate::core::types::{StringMap, WorkflowName};
use crate::error::{Error, Result, SubmissionError};

const TIMEOUT: Duration = Duration::from_secs(30);
const REOPEN_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    creation_timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    #[serde(default)]
    phase: String,
    #[serde(default)]
    finished_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Workflow {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    status: Status,
}

#[derive(Debug, Deserialize)]
struct WorkflowList {
    #[serde(default)]
    items: Option<Vec<Workflow>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry {
    #[serde(default)]
    content: String,
    #[serde(default)]
    pod_name: String,
}

#[derive(Debug, Deserialize)]
struct LogLine {
    result: Option<LogEntry>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn unix_seconds(timestamp: Option<&str>) -> Option<String> {
    timestamp
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.timestamp().to_string())
}

impl Workflow {
    fn into_status(self) -> WorkflowStatus {
        let status = WorkflowStatus {
            name: self.metadata.name,
            status: self.status.phase.to_lowercase(),
            created: unix_seconds(self.metadata.creation_timestamp.as_deref())
                .unwrap_or_else(|| "0".to_string()),
            finished: None,
        };
        if status.is_active() {
            return status;
        }
        WorkflowStatus {
            finished: unix_seconds(self.status.finished_at.as_deref()),
            ..status
        }
    }
}

/// Blocking client for one engine namespace.
pub struct ArgoWorkflow {
    client: Client,
    address: String,
    namespace: String,
    token: Option<Zeroizing<String>>,
    reopen_pause: Duration,
}

impl ArgoWorkflow {
    pub fn new(config: &ArgoConfig) -> Result<Self> {
        // Log tails stay open for the life of a workflow; short calls set
        // their own timeout.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| SubmissionError::Request(e.to_string()))?;

        Ok(Self {
            client,
            address: config.address.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
            token: config.token.clone().map(Zeroizing::new),
            reopen_pause: REOPEN_PAUSE,
        })
    }

    /// Pause between a finished log stream and the next attempt.
    pub fn with_reopen_pause(mut self, pause: Duration) -> Self {
        self.reopen_pause = pause;
        self
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/api/v1/workflows/{}{}",
            self.address, self.namespace, suffix
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder, workflow: Option<&str>) -> Result<Response> {
        let response = self
            .authorize(builder)
            .send()
            .map_err(|e| SubmissionError::Request(e.to_string()))?;

        let status = response.status();
        trace!(status = status.as_u16(), "workflow engine response");

        if status.is_success() {
            return Ok(response);
        }
        if let (StatusCode::NOT_FOUND, Some(name)) = (status, workflow) {
            return Err(Error::not_found("workflow", name));
        }

        let body = response.text().unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) if !parsed.message.is_empty() => parsed.message,
            _ => body,
        };
        Err(SubmissionError::Rejected {
            status: status.as_u16(),
            message,
        }
        .into())
    }

    fn get_workflow(&self, name: &str) -> Result<Workflow> {
        let request = self.client.get(self.url(&format!("/{}", name))).timeout(TIMEOUT);
        let response = self.send(request, Some(name))?;
        response
            .json()
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()).into())
    }

    fn open_logs(&self, name: &str, follow: bool) -> Result<Response> {
        let mut query = vec![("logOptions.container", MAIN_CONTAINER)];
        if follow {
            query.push(("logOptions.follow", "true"));
        }
        let mut request = self
            .client
            .get(self.url(&format!("/{}/log", name)))
            .query(&query);
        if !follow {
            request = request.timeout(TIMEOUT);
        }
        self.send(request, Some(name))
    }
}

/// Decode one NDJSON log line; blank lines carry nothing.
fn parse_log_line(line: &str) -> Result<Option<LogEvent>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let parsed: LogLine = serde_json::from_str(line)
        .map_err(|e| SubmissionError::InvalidResponse(format!("log line: {}", e)))?;
    if let Some(error) = parsed.error {
        return Err(SubmissionError::InvalidResponse(format!("log stream error: {}", error)).into());
    }
    Ok(parsed.result.map(|entry| LogEvent {
        pod_name: entry.pod_name,
        content: entry.content,
    }))
}

impl WorkflowEngine for ArgoWorkflow {
    fn submit(
        &self,
        template_ref: &str,
        parameters: &StringMap,
        labels: &StringMap,
    ) -> Result<WorkflowName> {
        let template = TemplateRef::parse(template_ref)?;

        let project = parameters.get("project_name").map(String::as_str).unwrap_or_default();
        let target = parameters.get("target_name").map(String::as_str).unwrap_or_default();

        let body = json!({
            "namespace": self.namespace,
            "resourceKind": template.kind,
            "resourceName": template.name,
            "submitOptions": {
                "generateName": generate_name(project, target),
                "parameters": parameters
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>(),
                "labels": labels
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(","),
            },
        });

        debug!(kind = template.kind, name = template.name, "submitting workflow");
        let request = self.client.post(self.url("/submit")).timeout(TIMEOUT).json(&body);
        let created: Workflow = self
            .send(request, None)?
            .json()
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;

        if created.metadata.name.is_empty() {
            return Err(SubmissionError::InvalidResponse("workflow has no name".to_string()).into());
        }

        let name = created.metadata.name.to_lowercase();
        info!(workflow = %name, "workflow submitted");
        Ok(name)
    }

    fn status(&self, name: &str) -> Result<WorkflowStatus> {
        let mut status = self.get_workflow(name)?.into_status();
        status.name = name.to_string();
        Ok(status)
    }

    fn logs(&self, name: &str) -> Result<WorkflowLogs> {
        let reader = BufReader::new(self.open_logs(name, false)?);
        let mut logs = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if let Some(event) = parse_log_line(&line)? {
                logs.push(event.to_string());
            }
        }
        Ok(WorkflowLogs { logs })
    }

    fn list(&self) -> Result<Vec<WorkflowStatus>> {
        let request = self.client.get(self.url("")).timeout(TIMEOUT);
        let list: WorkflowList = self
            .send(request, None)?
            .json()
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;

        Ok(list
            .items
            .unwrap_or_default()
            .into_iter()
            .map(Workflow::into_status)
            .collect())
    }

    fn log_stream(&self, name: &str, cancel: &CancelToken, sink: &mut LogSink<'_>) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                debug!(workflow = name, "log stream cancelled");
                return Ok(());
            }

            let mut lines = BufReader::new(self.open_logs(name, true)?).lines();
            loop {
                if cancel.is_cancelled() {
                    debug!(workflow = name, "log stream cancelled");
                    return Ok(());
                }
                match lines.next() {
                    Some(line) => {
                        if let Some(event) = parse_log_line(&line?)? {
                            sink(event)?;
                        }
                    }
                    None => break,
                }
            }

            let status = self.status(name)?;
            if !status.is_active() {
                debug!(workflow = name, phase = %status.status, "log stream finished");
                return Ok(());
            }

            warn!(workflow = name, "log stream ended while workflow is active, reopening");
            std::thread::sleep(self.reopen_pause);
        }
    }
}
