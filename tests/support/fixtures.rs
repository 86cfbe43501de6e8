//! Test fixtures and constants.

use std::path::Path;

/// Admin secret written into every test config.
pub const ADMIN_SECRET: &str = "0123456789abcdef";

/// Authorization header for the admin identity.
pub const ADMIN_AUTH: &str = "vault:admin:0123456789abcdef";

/// Authorization header for a project identity.
pub const PROJECT_AUTH: &str = "vault:role-payments:secret-payments";

/// Token the service identity receives from the mock backend.
pub const SERVICE_TOKEN: &str = "hvs.service";

pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/deploy";

/// `bullpen.toml` for the given backend addresses.
pub fn config_toml(vault: &str, argo: &str, cache_dir: &Path) -> String {
    format!(
        r#"
[server]
admin_secret = "{admin}"

[vault]
address = "{vault}"
role = "service-role"
secret = "service-secret"

[argo]
address = "{argo}"
namespace = "argo"

[git]
cache_dir = '{cache}'

[commands.terraform]
diff = "{{{{.EnvironmentVariables}}}} terraform init {{{{.InitArguments}}}} && {{{{.EnvironmentVariables}}}} terraform plan {{{{.ExecuteArguments}}}}"
sync = "{{{{.EnvironmentVariables}}}} terraform init {{{{.InitArguments}}}} && {{{{.EnvironmentVariables}}}} terraform apply -auto-approve {{{{.ExecuteArguments}}}}"

[projects.payments]
repository = "https://github.com/org/payments.git"
"#,
        admin = ADMIN_SECRET,
        vault = vault,
        argo = argo,
        cache = cache_dir.display(),
    )
}

/// A workflow request as callers send it.
pub const SAMPLE_REQUEST: &str = r#"{
    "framework": "terraform",
    "type": "sync",
    "project_name": "payments",
    "target_name": "prod_account",
    "workflow_template_name": "bullpen-single-step",
    "arguments": { "init": ["-upgrade"], "execute": ["-var", "x=1"] },
    "environment_variables": { "TF_LOG": "info" },
    "parameters": { "execute_container_image_uri": "hashicorp/terraform:1.5.7" }
}"#;
