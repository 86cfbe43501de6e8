//! Input validation.
//!
//! Pure checks applied to every structured input before it can reach the
//! credential backend or the workflow engine. Failures carry the offending
//! field and the violated rule; the wording is part of the client contract.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::constants::{
    ARGS_EXECUTE, ARGS_INIT, CREDENTIAL_TYPE_ASSUMED_ROLE, MAX_POLICY_ARNS, PARAM_EXECUTE_IMAGE,
    PARAM_PRE_IMAGE, TARGET_TYPE_AWS_ACCOUNT,
};
use crate::core::domain::{GitWorkflowRequest, Target, TargetProperties, WorkflowRequest};
use crate::core::types::{Arguments, StringMap};
use crate::error::{Result, ValidationError};

const NAME_MIN: usize = 4;
const NAME_MAX: usize = 32;
const IMAGE_NAME_MAX: usize = 255;

fn fail<T>(field: &str, rule: impl Into<String>) -> Result<T> {
    Err(ValidationError::new(field, rule).into())
}

static RE_IMAGE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-f0-9]{64}$").unwrap());

/// `[domain[:port]/]path[:tag][@digest]` with the lower-case path grammar of
/// the container distribution spec.
static RE_IMAGE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<name>",
        r"(?:(?:(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])(?:\.(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]))*",
        r"|\[[a-fA-F0-9:]+\])(?::[0-9]+)?/)?",
        r"[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*",
        r"(?:/[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*)*",
        r")",
        r"(?::[\w][\w.-]{0,127})?",
        r"(?:@[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,})?$",
    ))
    .unwrap()
});

static RE_COMMIT_HASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{7,64}$").unwrap());

static RE_TOKEN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]{0,63}$").unwrap());

static RE_GIT_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"((git|ssh|https)|(git@[\w\.]+))(:(//)?)([\w\.@:/\-~]+)(\.git)(/)?").unwrap()
});

/// Validate a project name: 4-32 ASCII letters or digits.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.len() < NAME_MIN || name.len() > NAME_MAX {
        return fail("project_name", "must be between 4 and 32 characters");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return fail("project_name", "must be alpha-numeric");
    }
    Ok(())
}

/// Validate a target name: 4-32 characters, a leading letter, then letters,
/// digits or underscores.
///
/// The credential backend rejects hyphens in role names.
pub fn validate_target_name(name: &str) -> Result<()> {
    if name.len() < NAME_MIN || name.len() > NAME_MAX {
        return fail("target_name", "must be between 4 and 32 characters");
    }
    let mut chars = name.chars();
    let leads_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !leads_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return fail(
            "target_name",
            "must start with a letter and contain only alpha-numeric or underscore characters",
        );
    }
    Ok(())
}

/// The sections of an Amazon Resource Name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn<'a> {
    pub partition: &'a str,
    pub service: &'a str,
    pub region: &'a str,
    pub account: &'a str,
    pub resource: &'a str,
}

impl<'a> Arn<'a> {
    /// Parse `arn:partition:service:region:account:resource`.
    ///
    /// The resource section keeps any further colons.
    pub fn parse(s: &'a str) -> Option<Self> {
        let mut sections = s.splitn(6, ':');
        if sections.next()? != "arn" {
            return None;
        }
        let arn = Self {
            partition: sections.next()?,
            service: sections.next()?,
            region: sections.next()?,
            account: sections.next()?,
            resource: sections.next()?,
        };
        if arn.partition.is_empty() || arn.service.is_empty() || arn.resource.is_empty() {
            return None;
        }
        Some(arn)
    }
}

/// True when `s` parses as an ARN.
pub fn is_valid_arn(s: &str) -> bool {
    Arn::parse(s).is_some()
}

/// True when `s` is a container image reference (`[domain/]path[:tag][@digest]`)
/// or a bare 64-hex image id.
pub fn is_valid_image_uri(s: &str) -> bool {
    if RE_IMAGE_ID.is_match(s) {
        return true;
    }
    RE_IMAGE_REFERENCE
        .captures(s)
        .and_then(|caps| caps.name("name"))
        .is_some_and(|name| name.as_str().len() <= IMAGE_NAME_MAX)
}

/// True when `s` is a full or abbreviated commit hash.
///
/// Branch names, revision expressions and anything option-like are rejected.
pub fn is_valid_commit_hash(s: &str) -> bool {
    RE_COMMIT_HASH.is_match(s)
}

/// Validate a project token id, the accessor of a SecretID.
pub fn validate_token_id(token_id: &str) -> Result<()> {
    if !RE_TOKEN_ID.is_match(token_id) {
        return fail("token_id", "must be 1-64 letters, digits or hyphens");
    }
    Ok(())
}

/// True when `s` looks like a clonable git remote ending in `.git`.
pub fn is_valid_git_repository(s: &str) -> bool {
    RE_GIT_URI.is_match(s)
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return fail(field, "is required");
    }
    Ok(())
}

/// Validate workflow parameters.
///
/// `execute_container_image_uri` is mandatory; `pre_container_image_uri` is
/// optional but checked the same way when present.
pub fn validate_parameters(parameters: &StringMap) -> Result<()> {
    match parameters.get(PARAM_EXECUTE_IMAGE) {
        None => return fail(PARAM_EXECUTE_IMAGE, "is required"),
        Some(image) if !is_valid_image_uri(image) => {
            return fail(PARAM_EXECUTE_IMAGE, "must be a valid container uri")
        }
        Some(_) => {}
    }

    if let Some(image) = parameters.get(PARAM_PRE_IMAGE) {
        if !is_valid_image_uri(image) {
            return fail(PARAM_PRE_IMAGE, "must be a valid container uri");
        }
    }

    Ok(())
}

/// Validate argument groups: only `init` and `execute` are accepted.
pub fn validate_arguments(arguments: &Arguments) -> Result<()> {
    for key in arguments.keys() {
        if key != ARGS_INIT && key != ARGS_EXECUTE {
            return fail(
                "arguments",
                format!("key '{}' is invalid, must be one of 'init' or 'execute'", key),
            );
        }
    }
    Ok(())
}

/// Validate target properties.
pub fn validate_target_properties(properties: &TargetProperties) -> Result<()> {
    if properties.credential_type != CREDENTIAL_TYPE_ASSUMED_ROLE {
        return fail("credential_type", "must be one of 'assumed_role'");
    }
    if !is_valid_arn(&properties.role_arn) {
        return fail(
            "role_arn",
            format!("'{}' must be a valid arn", properties.role_arn),
        );
    }
    if properties.policy_arns.len() > MAX_POLICY_ARNS {
        return fail("policy_arns", "cannot contain more than 5 entries");
    }
    if let Some(bad) = properties.policy_arns.iter().find(|arn| !is_valid_arn(arn)) {
        return fail("policy_arns", format!("'{}' must be a valid arn", bad));
    }
    Ok(())
}

/// Validate a full target definition.
pub fn validate_target(target: &Target) -> Result<()> {
    validate_target_name(&target.name)?;
    if target.kind != TARGET_TYPE_AWS_ACCOUNT {
        return fail("type", "must be one of 'aws_account'");
    }
    validate_target_properties(&target.properties)
}

/// Validate a workflow request against the operations its framework offers.
pub fn validate_workflow_request(request: &WorkflowRequest, operations: &[String]) -> Result<()> {
    validate_project_name(&request.project_name)?;
    validate_target_name(&request.target_name)?;
    require_non_empty("workflow_template_name", &request.workflow_template_name)?;

    if !operations.iter().any(|op| op == &request.operation) {
        return fail(
            "type",
            format!("must be one of '{}'", operations.join(" ")),
        );
    }

    validate_parameters(&request.parameters)?;
    validate_arguments(&request.arguments)
}

/// Validate a request to run a manifest from git.
pub fn validate_git_request(request: &GitWorkflowRequest) -> Result<()> {
    if let Some(repository) = &request.repository {
        if !is_valid_git_repository(repository) {
            return fail("repository", "must be a valid git uri");
        }
    }
    if !is_valid_commit_hash(&request.commit_hash) {
        return fail("sha", "must be a commit hash of 7 to 64 hexadecimal characters");
    }
    require_non_empty("path", &request.path)?;
    require_non_empty("type", &request.operation)
}
