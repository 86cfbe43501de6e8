//! Credential broker.
//!
//! Per-project isolation in the secret backend: each project owns a policy
//! and a machine identity, each target is a scoped cloud role beneath the
//! project, and workflows receive a short-lived token minted from the
//! project's identity.
//!
//! ## Adding a New Provider
//!
//! 1. Add a variant to `ProviderKind`
//! 2. Implement `CredentialProvider` in a new file
//! 3. Build it from `ProviderFactory::provider`

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::config::VaultConfig;
use crate::core::domain::{
    Authorization, CredentialToken, Project, ProjectCredentials, ProjectToken, ProviderKind,
    Target,
};
use crate::core::types::TargetName;
use crate::error::Result;

mod http;
mod vault;

pub use http::HttpVault;
pub use vault::{VaultApi, VaultAuth, VaultProvider, VaultResponse};

/// Operations a credential backend offers for one caller identity.
///
/// Every admin-only operation fails with `ProviderError::AdminRequired`
/// unless the identity's key is `admin`.
pub trait CredentialProvider {
    /// Provision a project's policy and machine identity.
    ///
    /// # Returns
    ///
    /// The only copy of the project's RoleID/SecretID pair.
    ///
    /// # Errors
    ///
    /// Any backend failure aborts; no partial credentials are returned.
    fn create_project(&self, name: &str) -> Result<ProjectCredentials>;

    /// Remove a project's policy, then its machine identity.
    fn delete_project(&self, name: &str) -> Result<()>;

    /// Read a project, failing `NotFound` if it does not exist.
    fn get_project(&self, name: &str) -> Result<Project>;

    /// Check whether a project exists.
    fn project_exists(&self, name: &str) -> Result<bool>;

    fn create_target(&self, project: &str, target: &Target) -> Result<()>;

    fn update_target(&self, project: &str, target: &Target) -> Result<()>;

    fn delete_target(&self, project: &str, name: &str) -> Result<()>;

    /// Read a target, failing `NotFound` if it does not exist.
    fn get_target(&self, project: &str, name: &str) -> Result<Target>;

    /// Names of a project's targets; empty when there are none.
    fn list_targets(&self, project: &str) -> Result<Vec<TargetName>>;

    /// Check whether a target exists.
    fn target_exists(&self, project: &str, name: &str) -> Result<bool>;

    /// Issue an additional SecretID for an existing project.
    ///
    /// # Returns
    ///
    /// The only copy of the new SecretID, with the project's RoleID and the
    /// SecretID's accessor.
    fn create_token(&self, project: &str) -> Result<ProjectCredentials>;

    /// Accessors of a project's live SecretIDs.
    fn list_project_tokens(&self, project: &str) -> Result<Vec<ProjectToken>>;

    /// Look up a SecretID by accessor; `None` when it does not exist.
    fn get_project_token(&self, project: &str, token_id: &str) -> Result<Option<ProjectToken>>;

    /// Revoke a SecretID by accessor.
    fn delete_project_token(&self, project: &str, token_id: &str) -> Result<()>;

    /// Mint a short-lived token from the caller's project identity.
    ///
    /// # Errors
    ///
    /// Always fails for an identity whose key is `admin`.
    fn get_token(&self) -> Result<CredentialToken>;
}

/// Builds a provider bound to one caller's authorization.
pub trait ProviderFactory: Send + Sync {
    fn provider(&self, auth: &Authorization) -> Result<Box<dyn CredentialProvider>>;

    /// Check the backend is reachable and serving.
    fn health(&self) -> Result<()>;
}

/// Factory for the Vault HTTP backend.
///
/// Each provider gets a fresh client logged in with the service's own
/// AppRole; the caller's pair is only used for `get_token`.
pub struct VaultFactory {
    address: String,
    role: String,
    secret: Zeroizing<String>,
}

impl VaultFactory {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            address: config.address.clone(),
            role: config.role.clone(),
            secret: Zeroizing::new(config.secret.clone()),
        }
    }
}

impl ProviderFactory for VaultFactory {
    fn provider(&self, auth: &Authorization) -> Result<Box<dyn CredentialProvider>> {
        debug!(provider = auth.provider().name(), "building credential provider");
        match auth.provider() {
            ProviderKind::Vault => {
                let mut api = HttpVault::new(&self.address)?;
                api.login(&self.role, &self.secret)?;
                Ok(Box::new(VaultProvider::new(api, auth)))
            }
        }
    }

    fn health(&self) -> Result<()> {
        HttpVault::new(&self.address)?.health()
    }
}
