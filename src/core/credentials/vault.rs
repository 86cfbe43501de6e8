//! Vault-backed credential provider.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::CredentialProvider;
use crate::core::constants::{
    ADMIN_KEY, APPROLE_PREFIX, AWS_ROLES_PATH, PROJECT_PREFIX, SECRET_ID_TTL,
    TARGET_TYPE_AWS_ACCOUNT, TOKEN_MAX_TTL, TOKEN_NUM_USES,
};
use crate::core::domain::{
    Authorization, CredentialToken, Project, ProjectCredentials, ProjectToken, Target,
    TargetProperties,
};
use crate::core::types::TargetName;
use crate::error::{Error, ProviderError, Result};

/// The slice of the Vault API the provider needs.
///
/// `read` and `list` return `None` when the path does not exist.
pub trait VaultApi {
    fn read(&self, path: &str) -> Result<Option<VaultResponse>>;
    fn write(&self, path: &str, data: &Value) -> Result<Option<VaultResponse>>;
    fn list(&self, path: &str) -> Result<Option<VaultResponse>>;
    fn delete(&self, path: &str) -> Result<()>;
    fn put_policy(&self, name: &str, rules: &str) -> Result<()>;
    fn delete_policy(&self, name: &str) -> Result<()>;
}

/// A logical response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultResponse {
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub auth: Option<VaultAuth>,
}

#[derive(Clone, Deserialize)]
pub struct VaultAuth {
    pub client_token: String,
}

impl std::fmt::Debug for VaultAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultAuth")
            .field("client_token", &"<redacted>")
            .finish()
    }
}

impl VaultResponse {
    fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(name))
    }

    fn string(&self, path: &str, name: &'static str) -> Result<String> {
        self.field(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| missing(path, name))
    }

    fn strings(&self, name: &str) -> Vec<String> {
        self.field(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn missing(path: &str, field: &'static str) -> Error {
    ProviderError::MissingField {
        path: path.to_string(),
        field,
    }
    .into()
}

fn policy_name(project: &str) -> String {
    format!("{}-{}", PROJECT_PREFIX, project)
}

fn approle_path(project: &str) -> String {
    format!("{}/{}", APPROLE_PREFIX, policy_name(project))
}

fn target_prefix(project: &str) -> String {
    format!("{}-{}-target-", PROJECT_PREFIX, project)
}

fn target_path(project: &str, target: &str) -> String {
    format!("{}/{}{}", AWS_ROLES_PATH, target_prefix(project), target)
}

/// Read-only access to the project's targets' STS credentials.
fn project_policy(project: &str) -> String {
    format!(
        "path \"aws/sts/{}*\" {{ capabilities = [\"read\"] }}",
        target_prefix(project)
    )
}

fn target_data(target: &Target) -> Value {
    json!({
        "credential_type": target.properties.credential_type,
        "policy_arns": target.properties.policy_arns,
        "policy_document": target.properties.policy_document,
        "role_arns": [target.properties.role_arn],
    })
}

/// Credential provider over a [`VaultApi`].
///
/// Bound to the caller's authorization: admin operations require the
/// `admin` key, token minting requires anything else.
pub struct VaultProvider<A> {
    api: A,
    role_id: String,
    secret_id: Zeroizing<String>,
}

impl<A: VaultApi> VaultProvider<A> {
    pub fn new(api: A, auth: &Authorization) -> Self {
        Self {
            api,
            role_id: auth.key().to_string(),
            secret_id: Zeroizing::new(auth.secret().to_string()),
        }
    }

    fn is_admin(&self) -> bool {
        self.role_id == ADMIN_KEY
    }

    fn require_admin(&self, action: &'static str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ProviderError::AdminRequired(action).into())
        }
    }

    fn write_role(&self, project: &str) -> Result<()> {
        let options = json!({
            "secret_id_ttl": SECRET_ID_TTL,
            "token_max_ttl": TOKEN_MAX_TTL,
            "token_no_default_policy": true,
            "token_num_uses": TOKEN_NUM_USES,
            "token_policies": policy_name(project),
        });
        self.api.write(&approle_path(project), &options)?;
        Ok(())
    }

    /// Returns the new SecretID and its accessor.
    fn generate_secret_id(&self, project: &str) -> Result<(String, String)> {
        let path = format!("{}/secret-id", approle_path(project));
        let response = self
            .api
            .write(&path, &json!({ "force": true }))?
            .ok_or_else(|| missing(&path, "secret_id"))?;
        Ok((
            response.string(&path, "secret_id")?,
            response.string(&path, "secret_id_accessor")?,
        ))
    }

    fn issue_credentials(&self, project: &str) -> Result<ProjectCredentials> {
        let (secret_id, accessor) = self.generate_secret_id(project)?;
        let role_id = self.read_role_id(project)?;
        Ok(ProjectCredentials::new(role_id, secret_id, accessor))
    }

    fn read_role_id(&self, project: &str) -> Result<String> {
        let path = format!("{}/role-id", approle_path(project));
        let response = self
            .api
            .read(&path)?
            .ok_or_else(|| missing(&path, "role_id"))?;
        response.string(&path, "role_id")
    }
}

impl<A: VaultApi> CredentialProvider for VaultProvider<A> {
    fn create_project(&self, name: &str) -> Result<ProjectCredentials> {
        self.require_admin("create project")?;

        debug!(project = name, "writing project policy");
        self.api.put_policy(&policy_name(name), &project_policy(name))?;

        debug!(project = name, "writing project role");
        self.write_role(name)?;

        let credentials = self.issue_credentials(name)?;

        info!(project = name, "project created");
        Ok(credentials)
    }

    fn delete_project(&self, name: &str) -> Result<()> {
        self.require_admin("delete project")?;

        self.api.delete_policy(&policy_name(name))?;
        self.api.delete(&approle_path(name))?;

        info!(project = name, "project deleted");
        Ok(())
    }

    fn get_project(&self, name: &str) -> Result<Project> {
        match self.api.read(&approle_path(name))? {
            Some(_) => Ok(Project {
                name: name.to_string(),
            }),
            None => Err(Error::not_found("project", name)),
        }
    }

    fn project_exists(&self, name: &str) -> Result<bool> {
        match self.get_project(name) {
            Ok(_) => Ok(true),
            Err(Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn create_target(&self, project: &str, target: &Target) -> Result<()> {
        self.require_admin("create target")?;

        self.api
            .write(&target_path(project, &target.name), &target_data(target))?;

        info!(project, target = %target.name, "target created");
        Ok(())
    }

    fn update_target(&self, project: &str, target: &Target) -> Result<()> {
        self.require_admin("update target")?;

        self.api
            .write(&target_path(project, &target.name), &target_data(target))?;

        info!(project, target = %target.name, "target updated");
        Ok(())
    }

    fn delete_target(&self, project: &str, name: &str) -> Result<()> {
        self.require_admin("delete target")?;

        self.api.delete(&target_path(project, name))?;

        info!(project, target = name, "target deleted");
        Ok(())
    }

    fn get_target(&self, project: &str, name: &str) -> Result<Target> {
        self.require_admin("get target information")?;

        let path = target_path(project, name);
        let response = self
            .api
            .read(&path)?
            .ok_or_else(|| Error::not_found("target", name))?;

        let role_arn = response
            .strings("role_arns")
            .into_iter()
            .next()
            .ok_or_else(|| missing(&path, "role_arns"))?;
        let credential_type = response.string(&path, "credential_type")?;
        let policy_document = response
            .field("policy_document")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Target {
            name: name.to_string(),
            // Not stored in the backend; every target is an AWS account.
            kind: TARGET_TYPE_AWS_ACCOUNT.to_string(),
            properties: TargetProperties {
                credential_type,
                policy_arns: response.strings("policy_arns"),
                policy_document,
                role_arn,
            },
        })
    }

    fn list_targets(&self, project: &str) -> Result<Vec<TargetName>> {
        self.require_admin("list targets")?;

        let prefix = target_prefix(project);
        let targets = match self.api.list(&format!("{}/", AWS_ROLES_PATH))? {
            Some(response) => response
                .strings("keys")
                .into_iter()
                .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
                .collect(),
            None => Vec::new(),
        };
        Ok(targets)
    }

    fn target_exists(&self, _project: &str, _name: &str) -> Result<bool> {
        // Target name uniqueness is not enforced; a create overwrites.
        Ok(false)
    }

    fn create_token(&self, project: &str) -> Result<ProjectCredentials> {
        self.require_admin("create project token")?;

        let credentials = self.issue_credentials(project)?;

        info!(project, token_id = credentials.token_id(), "project token created");
        Ok(credentials)
    }

    fn list_project_tokens(&self, project: &str) -> Result<Vec<ProjectToken>> {
        self.require_admin("list project tokens")?;

        let path = format!("{}/secret-id", approle_path(project));
        let tokens = match self.api.list(&path)? {
            Some(response) => response
                .strings("keys")
                .into_iter()
                .map(|token_id| ProjectToken { token_id })
                .collect(),
            None => Vec::new(),
        };
        Ok(tokens)
    }

    fn get_project_token(&self, project: &str, token_id: &str) -> Result<Option<ProjectToken>> {
        self.require_admin("get project token")?;

        let path = format!("{}/secret-id-accessor/lookup", approle_path(project));
        let response = self
            .api
            .write(&path, &json!({ "secret_id_accessor": token_id }))?;

        match response.filter(|r| r.data.is_some()) {
            Some(response) => Ok(Some(ProjectToken {
                token_id: response.string(&path, "secret_id_accessor")?,
            })),
            None => Ok(None),
        }
    }

    fn delete_project_token(&self, project: &str, token_id: &str) -> Result<()> {
        self.require_admin("delete project token")?;

        let path = format!("{}/secret-id-accessor/destroy", approle_path(project));
        self.api
            .write(&path, &json!({ "secret_id_accessor": token_id }))?;

        info!(project, token_id, "project token deleted");
        Ok(())
    }

    fn get_token(&self) -> Result<CredentialToken> {
        if self.is_admin() {
            return Err(ProviderError::AdminToken.into());
        }

        let path = "auth/approle/login";
        let login = json!({
            "role_id": self.role_id,
            "secret_id": self.secret_id.as_str(),
        });
        let auth = self
            .api
            .write(path, &login)?
            .and_then(|response| response.auth)
            .ok_or_else(|| missing(path, "auth"))?;

        let token = CredentialToken::new(auth.client_token);
        debug!(token = token.head(), "minted workflow token");
        Ok(token)
    }
}

/// Records every call and answers from canned responses.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MockVault {
    pub calls: std::sync::Mutex<Vec<String>>,
    pub responses: std::collections::HashMap<String, Value>,
    pub fail_on: Option<String>,
}

#[cfg(test)]
impl MockVault {
    fn record(&self, call: String) -> Result<()> {
        let fail = self.fail_on.as_deref().is_some_and(|f| call.contains(f));
        self.calls.lock().unwrap().push(call.clone());
        if fail {
            return Err(ProviderError::Status {
                status: 500,
                path: call,
                message: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn answer(&self, path: &str) -> Option<VaultResponse> {
        self.responses
            .get(path)
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl VaultApi for &MockVault {
    fn read(&self, path: &str) -> Result<Option<VaultResponse>> {
        self.record(format!("read {}", path))?;
        Ok(self.answer(path))
    }

    fn write(&self, path: &str, _data: &Value) -> Result<Option<VaultResponse>> {
        self.record(format!("write {}", path))?;
        Ok(self.answer(path))
    }

    fn list(&self, path: &str) -> Result<Option<VaultResponse>> {
        self.record(format!("list {}", path))?;
        Ok(self.answer(path))
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.record(format!("delete {}", path))
    }

    fn put_policy(&self, name: &str, _rules: &str) -> Result<()> {
        self.record(format!("put_policy {}", name))
    }

    fn delete_policy(&self, name: &str) -> Result<()> {
        self.record(format!("delete_policy {}", name))
    }
}
