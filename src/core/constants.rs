//! Constants used throughout bullpen.
//!
//! Centralizes backend path prefixes, credential limits and well-known
//! parameter names.

/// Default configuration file name.
pub const CONFIG_FILE: &str = "bullpen.toml";

/// Prefix for every environment variable override (`BULLPEN_ADMIN_SECRET`, ...).
pub const ENV_PREFIX: &str = "BULLPEN_";

/// Authorization key that marks an admin identity.
pub const ADMIN_KEY: &str = "admin";

/// Minimum accepted admin secret length.
pub const MIN_ADMIN_SECRET_LEN: usize = 16;

/// AppRole mount path in the credential backend.
pub const APPROLE_PREFIX: &str = "auth/approle/role";

/// Namespace applied to every project policy, role and target.
pub const PROJECT_PREFIX: &str = "bullpen-projects";

/// AWS secrets engine roles path.
pub const AWS_ROLES_PATH: &str = "aws/roles";

/// Lifetime of a project's SecretID (one year).
pub const SECRET_ID_TTL: &str = "8776h";

/// Maximum lifetime of a token minted from a project identity.
pub const TOKEN_MAX_TTL: &str = "10m";

/// Uses allowed per minted token. Must stay above 1.
pub const TOKEN_NUM_USES: u32 = 3;

/// The only supported target type.
pub const TARGET_TYPE_AWS_ACCOUNT: &str = "aws_account";

/// The only supported target credential type.
pub const CREDENTIAL_TYPE_ASSUMED_ROLE: &str = "assumed_role";

/// Maximum number of managed policies attached to a target.
pub const MAX_POLICY_ARNS: usize = 5;

/// Maximum number of live SecretIDs a project may hold.
pub const MAX_PROJECT_TOKENS: usize = 2;

/// Request parameter carrying the execution image.
pub const PARAM_EXECUTE_IMAGE: &str = "execute_container_image_uri";

/// Request parameter carrying the optional pre-execution image.
pub const PARAM_PRE_IMAGE: &str = "pre_container_image_uri";

/// Argument group rendered into `{{.InitArguments}}`.
pub const ARGS_INIT: &str = "init";

/// Argument group rendered into `{{.ExecuteArguments}}`.
pub const ARGS_EXECUTE: &str = "execute";

/// Label attached to submitted workflows for request correlation.
pub const TRACE_LABEL: &str = "x-b3-traceid";

/// Engine resource kind used for request-driven submissions.
pub const WORKFLOW_TEMPLATE_KIND: &str = "workflowtemplate";

/// Container whose logs are reported.
pub const MAIN_CONTAINER: &str = "main";

/// Default engine namespace.
pub const DEFAULT_NAMESPACE: &str = "argo";
