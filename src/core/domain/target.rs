//! Target types.
//!
//! A target binds a project to a cloud role reachable only inside that
//! project's credential scope.

use serde::{Deserialize, Serialize};

use crate::core::types::TargetName;

/// A named credential binding under a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: TargetName,
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: TargetProperties,
}

/// How the target's credentials are produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetProperties {
    pub credential_type: String,
    #[serde(default)]
    pub policy_arns: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub policy_document: String,
    pub role_arn: String,
}
