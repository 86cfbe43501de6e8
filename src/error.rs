//! Error types for bullpen.
//!
//! `Error` is the classified value every core operation returns. Each area
//! (configuration, credential backend, git, workflow engine, command
//! rendering) owns a nested enum so front ends can match on the category
//! without parsing messages.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid authorization header: {0}")]
    AuthorizationMalformed(String),

    #[error("must be an authorized admin")]
    NotAuthorizedAdmin,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable classification used by front ends to choose a status or exit hint.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AuthorizationMalformed(_) => "authorization_malformed",
            Error::NotAuthorizedAdmin => "not_authorized_admin",
            Error::Validation(_) => "validation_failed",
            Error::NotFound { .. } => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Provider(_) => "provider_error",
            Error::Fetch(_) | Error::Manifest(_) => "fetch_error",
            Error::Submission(_) => "submission_error",
            Error::Command(_) => "command_error",
            Error::Config(_) => "config_error",
            Error::Io(_) | Error::Json(_) => "internal_error",
        }
    }

    /// Process exit status for a front end reporting this error.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            "authorization_malformed" | "validation_failed" => 2,
            "not_authorized_admin" => 3,
            "not_found" => 4,
            "conflict" => 5,
            _ => 1,
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// A structured input failed a validation rule.
///
/// The rendered message is `"<field> <rule>"` and is part of the client
/// contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} {rule}")]
pub struct ValidationError {
    pub field: String,
    pub rule: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
        }
    }
}

/// Credential backend failures.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("unable to reach credential backend: {0}")]
    Request(String),

    #[error("credential backend returned {status} for '{path}': {message}")]
    Status {
        status: u16,
        path: String,
        message: String,
    },

    #[error("credential backend response for '{path}' is missing '{field}'")]
    MissingField { path: String, field: &'static str },

    #[error("admin credentials must be used to {0}")]
    AdminRequired(&'static str),

    #[error("admin credentials cannot be used to get tokens")]
    AdminToken,

    #[error("credential backend is unhealthy (status {0})")]
    Unhealthy(u16),
}

/// Git manifest retrieval failures.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("git executable not found in PATH")]
    GitUnavailable,

    #[error("git {operation} failed: {message}")]
    Git {
        operation: &'static str,
        message: String,
    },

    #[error("'{0}' is not a commit hash")]
    InvalidCommit(String),

    #[error("path provided is not a file '{0}'")]
    NotAFile(String),

    #[error("path '{0}' escapes the repository")]
    PathOutsideRepository(String),

    #[error("unable to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Workflow engine failures.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("resource identifier '{0}' is malformed. Should be `kind/name`, e.g. workflowtemplate/hello-world")]
    MalformedTemplateRef(String),

    #[error("unable to reach workflow engine: {0}")]
    Request(String),

    #[error("workflow engine rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid workflow engine response: {0}")]
    InvalidResponse(String),
}

/// Command template failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown framework '{0}'")]
    UnknownFramework(String),

    #[error("unknown operation type '{0}'")]
    UnknownOperation(String),

    #[error("unknown template variable '{0}'")]
    UnknownVariable(String),
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("unable to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("unable to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config is missing '{field}'")]
    MissingField { field: &'static str },

    #[error("config value '{field}' is invalid: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
