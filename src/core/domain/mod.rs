//! Domain types.

mod authorization;
mod project;
mod request;
mod target;
mod token;
mod workflow;

pub use authorization::{Authorization, Identity, ProviderKind};
pub use project::{Project, ProjectCredentials, ProjectEntry, ProjectToken};
pub use request::{GitWorkflowRequest, ManifestFetchKey, WorkflowRequest};
pub use target::{Target, TargetProperties};
pub use token::CredentialToken;
pub use workflow::{LogEvent, WorkflowLogs, WorkflowStatus};
