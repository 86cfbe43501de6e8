//! Bullpen - a multi-tenant control plane for infrastructure workflows.
//!
//! Projects are tenants. Each project owns deployment targets (cloud accounts
//! plus the role and policies to assume there). A project submits workflows
//! that run an infrastructure tool inside an Argo Workflows template; bullpen
//! renders the tool command, mints a short-lived Vault token scoped to the
//! project's targets and hands both to the workflow.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── project       # Project administration
//! │   ├── target        # Target administration
//! │   ├── workflow      # Submit, inspect and tail workflows
//! │   ├── health        # Backend health check
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # bullpen.toml loading and validation
//!     ├── domain/       # Authorization, projects, targets, requests
//!     ├── validation    # Field rules shared by every entry point
//!     ├── command       # Framework command templates
//!     ├── credentials/  # Credential provider trait
//!     │   ├── vault     # AppRole/AWS secrets engine layout
//!     │   └── http      # Vault HTTP client
//!     ├── manifest/     # Workflow manifests from git
//!     │   └── git       # git CLI backend
//!     ├── workflow/     # Workflow engine trait
//!     │   └── argo      # Argo Workflows server client
//!     ├── store/        # Project to repository lookup
//!     └── orchestrator  # Request sequencing
//! ```
//!
//! # Features
//!
//! - Per-project AppRole identities with policies scoped to their targets
//! - Tokens minted per workflow, never cached
//! - Validation before any backend call
//! - Manifests pinned to a commit in the project's repository
//! - Pluggable credential, git and workflow backends

pub mod cli;
pub mod core;
pub mod error;
