//! Configuration file management.
//!
//! Handles reading and validating `bullpen.toml`. The configuration is
//! loaded once at startup and handed to component constructors by value;
//! nothing reads process-wide state after that.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::command::Commands;
use crate::core::constants::{self, DEFAULT_NAMESPACE, ENV_PREFIX, MIN_ADMIN_SECRET_LEN};
use crate::core::domain::ProjectEntry;
use crate::core::types::{Framework, OperationTemplates, ProjectName};
use crate::core::validation;
use crate::error::{ConfigError, Result};

/// Service configuration stored in `bullpen.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub argo: ArgoConfig,
    #[serde(default)]
    pub git: GitConfig,
    /// Command templates, `[commands.<framework>] <operation> = "<template>"`.
    #[serde(default)]
    pub commands: BTreeMap<Framework, OperationTemplates>,
    /// Project metadata, `[projects.<name>] repository = "..."`.
    #[serde(default)]
    pub projects: BTreeMap<ProjectName, ProjectSettings>,
}

#[derive(Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Secret presented with the `admin` key.
    #[serde(default)]
    pub admin_secret: String,
}

/// Credential backend connection and the service's own machine identity.
#[derive(Default, Serialize, Deserialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub address: String,
    /// RoleID the service logs in with for admin operations.
    #[serde(default)]
    pub role: String,
    /// SecretID paired with `role`.
    #[serde(default)]
    pub secret: String,
}

#[derive(Serialize, Deserialize)]
pub struct ArgoConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Optional bearer token for the engine API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for ArgoConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            namespace: default_namespace(),
            token: None,
        }
    }
}

/// How the git working copies authenticate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitAuth {
    /// Anonymous access or ambient credentials.
    #[default]
    None,
    Ssh,
    Https,
}

impl std::str::FromStr for GitAuth {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(GitAuth::None),
            "ssh" => Ok(GitAuth::Ssh),
            "https" => Ok(GitAuth::Https),
            other => Err(ConfigError::InvalidValue {
                field: "git.auth",
                reason: format!("'{}' must be one of 'ssh' or 'https'", other),
            }),
        }
    }
}

#[derive(Default, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default)]
    pub auth: GitAuth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_pass: Option<String>,
    /// Where working copies live. Defaults to the user cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl GitConfig {
    /// Base directory for repository working copies.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("bullpen")
                .join("repositories")
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub repository: String,
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("admin_secret", &redacted(&self.admin_secret))
            .finish()
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("role", &self.role)
            .field("secret", &redacted(&self.secret))
            .finish()
    }
}

impl std::fmt::Debug for ArgoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgoConfig")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("token", &self.token.as_deref().map(redacted))
            .finish()
    }
}

impl std::fmt::Debug for GitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitConfig")
            .field("auth", &self.auth)
            .field("ssh_key", &self.ssh_key)
            .field("https_user", &self.https_user)
            .field("https_pass", &self.https_pass.as_deref().map(redacted))
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

impl Config {
    /// Default configuration path in the current directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from(constants::CONFIG_FILE)
    }

    /// Load, apply `BULLPEN_*` overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist,
    /// `ConfigError::Parse` if the TOML is malformed, or a validation error.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env(|key| std::env::var(key).ok())?;

        debug!(
            frameworks = config.commands.len(),
            projects = config.projects.len(),
            "config loaded"
        );

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML without overrides or validation.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents).map_err(ConfigError::Parse)?)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognized names, each prefixed with `BULLPEN_`: `ADMIN_SECRET`,
    /// `VAULT_ADDR`, `VAULT_ROLE`, `VAULT_SECRET`, `ARGO_ADDR`,
    /// `ARGO_NAMESPACE`, `ARGO_TOKEN`, `GIT_AUTH`, `GIT_SSH_KEY`,
    /// `GIT_HTTPS_USER`, `GIT_HTTPS_PASS`, `CACHE_DIR`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("ADMIN_SECRET") {
            self.server.admin_secret = v;
        }
        if let Some(v) = var("VAULT_ADDR") {
            self.vault.address = v;
        }
        if let Some(v) = var("VAULT_ROLE") {
            self.vault.role = v;
        }
        if let Some(v) = var("VAULT_SECRET") {
            self.vault.secret = v;
        }
        if let Some(v) = var("ARGO_ADDR") {
            self.argo.address = v;
        }
        if let Some(v) = var("ARGO_NAMESPACE") {
            self.argo.namespace = v;
        }
        if let Some(v) = var("ARGO_TOKEN") {
            self.argo.token = Some(v);
        }
        if let Some(v) = var("GIT_AUTH") {
            self.git.auth = v.parse()?;
        }
        if let Some(v) = var("GIT_SSH_KEY") {
            self.git.ssh_key = Some(PathBuf::from(v));
        }
        if let Some(v) = var("GIT_HTTPS_USER") {
            self.git.https_user = Some(v);
        }
        if let Some(v) = var("GIT_HTTPS_PASS") {
            self.git.https_pass = Some(v);
        }
        if let Some(v) = var("CACHE_DIR") {
            self.git.cache_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Command templates as a renderer.
    pub fn commands(&self) -> Commands {
        Commands::new(self.commands.clone())
    }

    /// Project metadata entries for the project store.
    pub fn project_entries(&self) -> Vec<ProjectEntry> {
        self.projects
            .iter()
            .map(|(name, settings)| ProjectEntry {
                name: name.clone(),
                repository: settings.repository.clone(),
            })
            .collect()
    }

    /// Validate the configuration structure and contents.
    ///
    /// Checks:
    /// - Admin secret is at least 16 characters
    /// - Vault address and service identity are present
    /// - Argo address and namespace are present
    /// - Git auth settings are complete for the selected mode
    /// - Every command template references only known variables
    /// - Every project repository is a git URI
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` or `ConfigError::MissingField` on validation failure.
    pub fn validate(&self) -> Result<()> {
        debug!("validating config");

        if self.server.admin_secret.is_empty() {
            return Err(ConfigError::MissingField {
                field: "server.admin_secret",
            }
            .into());
        }
        if self.server.admin_secret.chars().count() < MIN_ADMIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                field: "server.admin_secret",
                reason: format!("must be at least {} characters", MIN_ADMIN_SECRET_LEN),
            }
            .into());
        }

        require_url("vault.address", &self.vault.address)?;
        if self.vault.role.is_empty() {
            return Err(ConfigError::MissingField { field: "vault.role" }.into());
        }
        if self.vault.secret.is_empty() {
            return Err(ConfigError::MissingField {
                field: "vault.secret",
            }
            .into());
        }

        require_url("argo.address", &self.argo.address)?;
        if self.argo.namespace.is_empty() {
            return Err(ConfigError::MissingField {
                field: "argo.namespace",
            }
            .into());
        }

        match self.git.auth {
            GitAuth::Ssh if self.git.ssh_key.is_none() => {
                return Err(ConfigError::MissingField {
                    field: "git.ssh_key",
                }
                .into());
            }
            GitAuth::Https if self.git.https_user.is_none() || self.git.https_pass.is_none() => {
                return Err(ConfigError::InvalidValue {
                    field: "git.auth",
                    reason: "https auth requires https_user and https_pass".to_string(),
                }
                .into());
            }
            _ => {}
        }

        self.commands().check()?;

        for (name, settings) in &self.projects {
            if !validation::is_valid_git_repository(&settings.repository) {
                return Err(ConfigError::InvalidValue {
                    field: "projects",
                    reason: format!("repository for '{}' is not a git uri", name),
                }
                .into());
            }
        }

        Ok(())
    }
}

fn require_url(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ConfigError::MissingField { field }.into());
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("'{}' must start with http:// or https://", value),
        }
        .into());
    }
    Ok(())
}
