//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

use std::collections::BTreeMap;

/// A project (tenant) name, e.g. `payments01`.
pub type ProjectName = String;

/// A target name within a project, e.g. `prod_account`.
pub type TargetName = String;

/// A workflow name assigned by the engine.
pub type WorkflowName = String;

/// Framework name keying the command configuration (e.g. `terraform`).
pub type Framework = String;

/// Operation type within a framework (e.g. `diff`, `sync`, `exec`).
pub type OperationType = String;

/// Command templates for one framework, keyed by operation type.
pub type OperationTemplates = BTreeMap<OperationType, String>;

/// Arguments grouped by stage (`init`, `execute`).
pub type Arguments = BTreeMap<String, Vec<String>>;

/// Flat string parameters or environment variables.
pub type StringMap = BTreeMap<String, String>;
