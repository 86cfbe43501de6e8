//! Command-line interface.

pub mod completions;
pub mod health;
pub mod output;
pub mod project;
pub mod target;
pub mod token;
pub mod workflow;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::config::Config;
use crate::core::constants::{CREDENTIAL_TYPE_ASSUMED_ROLE, TARGET_TYPE_AWS_ACCOUNT};
use crate::core::domain::{GitWorkflowRequest, TargetProperties};
use crate::core::orchestrator::Orchestrator;
use crate::error::Result;

/// Bullpen - a multi-tenant control plane for infrastructure workflows.
#[derive(Parser)]
#[command(
    name = "bullpen",
    about = "Broker scoped cloud credentials into infrastructure workflows",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to bullpen.toml
    #[arg(short, long, global = true, env = "BULLPEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Authorization as <provider>:<key>:<secret>
    #[arg(long, global = true, env = "BULLPEN_AUTH", hide_env_values = true)]
    pub auth: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Manage projects (admin)
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage a project's targets (admin)
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },

    /// Manage a project's tokens (admin)
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Submit and inspect workflows
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },

    /// Check the credential backend
    Health,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Project subcommands.
#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project and print its role_id/secret_id
    Create {
        /// Project name (4-32 alpha-numeric characters)
        name: String,
    },

    /// Show a project
    Get {
        /// Project name
        name: String,
    },

    /// Delete a project that has no targets
    Delete {
        /// Project name
        name: String,
    },
}

/// Project token subcommands.
#[derive(Subcommand)]
pub enum TokenAction {
    /// Issue another secret_id for a project (at most two live)
    Create {
        /// Project name
        project: String,
    },

    /// Show a token
    Get {
        /// Project name
        project: String,
        /// Token id (the secret_id accessor)
        token_id: String,
    },

    /// Revoke a token
    Delete {
        /// Project name
        project: String,
        /// Token id (the secret_id accessor)
        token_id: String,
    },

    /// List a project's token ids
    List {
        /// Project name
        project: String,
    },
}

/// Target subcommands.
#[derive(Subcommand)]
pub enum TargetAction {
    /// Create a target under a project
    Create {
        /// Project name
        project: String,
        /// Target name
        name: String,
        #[command(flatten)]
        properties: PropertiesArgs,
    },

    /// Replace a target's properties
    Update {
        /// Project name
        project: String,
        /// Target name
        name: String,
        #[command(flatten)]
        properties: PropertiesArgs,
    },

    /// Show a target
    Get {
        /// Project name
        project: String,
        /// Target name
        name: String,
    },

    /// Delete a target
    Delete {
        /// Project name
        project: String,
        /// Target name
        name: String,
    },

    /// List a project's targets
    List {
        /// Project name
        project: String,
    },
}

/// Target properties given on the command line.
#[derive(Args, Debug)]
pub struct PropertiesArgs {
    /// Target type
    #[arg(long = "type", default_value = TARGET_TYPE_AWS_ACCOUNT)]
    pub kind: String,

    /// How credentials are produced
    #[arg(long, default_value = CREDENTIAL_TYPE_ASSUMED_ROLE)]
    pub credential_type: String,

    /// Role to assume in the target account
    #[arg(long)]
    pub role_arn: String,

    /// Managed policy to attach (repeatable, at most 5)
    #[arg(long = "policy-arn")]
    pub policy_arns: Vec<String>,

    /// File holding an inline policy document
    #[arg(long)]
    pub policy_document: Option<PathBuf>,
}

impl PropertiesArgs {
    fn into_properties(self) -> Result<(String, TargetProperties)> {
        let policy_document = match self.policy_document {
            Some(path) => std::fs::read_to_string(path)?,
            None => String::new(),
        };
        Ok((
            self.kind,
            TargetProperties {
                credential_type: self.credential_type,
                policy_arns: self.policy_arns,
                policy_document,
                role_arn: self.role_arn,
            },
        ))
    }
}

/// Workflow subcommands.
#[derive(Subcommand)]
pub enum WorkflowAction {
    /// Submit a workflow request read from a JSON file ("-" for stdin)
    Create {
        /// Request file
        request: PathBuf,
    },

    /// Submit the workflow manifest stored in the project's repository
    FromGit {
        /// Project name
        project: String,
        /// Commit hash to check out
        #[arg(long)]
        sha: String,
        /// Manifest path inside the repository
        #[arg(long)]
        path: String,
        /// Operation type
        #[arg(long = "type")]
        operation: String,
        /// Expected repository; must be the project's registered one
        #[arg(long)]
        repository: Option<String>,
    },

    /// Show a workflow's status
    Status {
        /// Workflow name
        name: String,
    },

    /// Print a workflow's logs
    Logs {
        /// Workflow name
        name: String,
        /// Keep streaming until the workflow finishes
        #[arg(short, long)]
        follow: bool,
    },

    /// List workflows submitted for a project's target
    List {
        /// Project name
        project: String,
        /// Target name
        target: String,
    },
}

/// Load configuration and build the production orchestrator.
fn orchestrator(config: Option<PathBuf>) -> Result<Orchestrator> {
    let path = config.unwrap_or_else(Config::default_path);
    let config = Config::load(&path)?;
    Orchestrator::from_config(&config)
}

/// Execute a parsed command line.
pub fn execute(cli: Cli) -> Result<()> {
    let auth = cli.auth.unwrap_or_default();

    match cli.command {
        Command::Completions { shell } => completions::execute(shell),
        Command::Health => health::execute(&orchestrator(cli.config)?),
        Command::Project { action } => {
            let orchestrator = orchestrator(cli.config)?;
            match action {
                ProjectAction::Create { name } => project::create(&orchestrator, &auth, &name),
                ProjectAction::Get { name } => project::get(&orchestrator, &auth, &name),
                ProjectAction::Delete { name } => project::delete(&orchestrator, &auth, &name),
            }
        }
        Command::Target { action } => {
            let orchestrator = orchestrator(cli.config)?;
            match action {
                TargetAction::Create {
                    project,
                    name,
                    properties,
                } => {
                    let (kind, properties) = properties.into_properties()?;
                    target::create(&orchestrator, &auth, &project, &name, kind, properties)
                }
                TargetAction::Update {
                    project,
                    name,
                    properties,
                } => {
                    let (_, properties) = properties.into_properties()?;
                    target::update(&orchestrator, &auth, &project, &name, properties)
                }
                TargetAction::Get { project, name } => {
                    target::get(&orchestrator, &auth, &project, &name)
                }
                TargetAction::Delete { project, name } => {
                    target::delete(&orchestrator, &auth, &project, &name)
                }
                TargetAction::List { project } => target::list(&orchestrator, &auth, &project),
            }
        }
        Command::Token { action } => {
            let orchestrator = orchestrator(cli.config)?;
            match action {
                TokenAction::Create { project } => token::create(&orchestrator, &auth, &project),
                TokenAction::Get { project, token_id } => {
                    token::get(&orchestrator, &auth, &project, &token_id)
                }
                TokenAction::Delete { project, token_id } => {
                    token::delete(&orchestrator, &auth, &project, &token_id)
                }
                TokenAction::List { project } => token::list(&orchestrator, &auth, &project),
            }
        }
        Command::Workflow { action } => {
            let orchestrator = orchestrator(cli.config)?;
            match action {
                WorkflowAction::Create { request } => {
                    workflow::create(&orchestrator, &auth, &request)
                }
                WorkflowAction::FromGit {
                    project,
                    sha,
                    path,
                    operation,
                    repository,
                } => workflow::from_git(
                    &orchestrator,
                    &auth,
                    &project,
                    GitWorkflowRequest {
                        repository,
                        commit_hash: sha,
                        path,
                        operation,
                    },
                ),
                WorkflowAction::Status { name } => workflow::status(&orchestrator, &name),
                WorkflowAction::Logs { name, follow } => {
                    workflow::logs(&orchestrator, &name, follow)
                }
                WorkflowAction::List { project, target } => {
                    workflow::list(&orchestrator, &project, &target)
                }
            }
        }
    }
}
