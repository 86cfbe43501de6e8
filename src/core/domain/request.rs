//! Workflow request types.

use serde::{Deserialize, Serialize};

use crate::core::types::{Arguments, Framework, OperationType, ProjectName, StringMap, TargetName};

/// A request to run one operation of a framework against a target.
///
/// Arrives as JSON from callers or as YAML from a git manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    #[serde(default)]
    pub arguments: Arguments,
    #[serde(default)]
    pub environment_variables: StringMap,
    #[serde(default)]
    pub framework: Framework,
    #[serde(default)]
    pub parameters: StringMap,
    #[serde(default)]
    pub project_name: ProjectName,
    #[serde(default)]
    pub target_name: TargetName,
    #[serde(rename = "type", default)]
    pub operation: OperationType,
    #[serde(default)]
    pub workflow_template_name: String,
}

impl WorkflowRequest {
    /// Decode a YAML manifest.
    pub fn from_yaml(bytes: &[u8]) -> crate::error::Result<Self> {
        Ok(serde_yaml::from_slice(bytes)?)
    }
}

/// A request to run the workflow described by a manifest in git.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitWorkflowRequest {
    /// Must name the project's registered repository when present; the
    /// manifest is always read from the registered one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(rename = "sha")]
    pub commit_hash: String,
    pub path: String,
    #[serde(rename = "type", default)]
    pub operation: OperationType,
}

/// Addresses one file at one commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestFetchKey {
    pub repository: String,
    pub commit_hash: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_request_from_yaml() {
        let yaml = br#"
framework: terraform
type: sync
project_name: payments
target_name: prod_account
workflow_template_name: bullpen-single-step
arguments:
  init:
    - -no-color
  execute:
    - -auto-approve
environment_variables:
  AWS_REGION: us-west-2
parameters:
  execute_container_image_uri: hashicorp/terraform:1.5.0
"#;
        let request = WorkflowRequest::from_yaml(yaml).unwrap();
        assert_eq!(request.framework, "terraform");
        assert_eq!(request.operation, "sync");
        assert_eq!(request.arguments["init"], vec!["-no-color"]);
        assert_eq!(request.environment_variables["AWS_REGION"], "us-west-2");
    }

    #[test]
    fn test_workflow_request_rejects_bad_yaml() {
        assert!(WorkflowRequest::from_yaml(b"framework: [unclosed").is_err());
    }

    #[test]
    fn test_git_request_json_names() {
        let json = r#"{"sha": "abc123", "path": "manifests/sync.yaml", "type": "sync"}"#;
        let request: GitWorkflowRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.commit_hash, "abc123");
        assert!(request.repository.is_none());
    }
}
