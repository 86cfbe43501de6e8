//! Request sequencing.
//!
//! Every external operation enters here: parse the caller's authorization,
//! validate input before any backend sees it, then drive the credential
//! provider, command renderer, manifest fetcher and workflow engine in order.

use tracing::{debug, info};

use crate::core::command::{environment_string, Commands};
use crate::core::config::Config;
use crate::core::constants::{MAX_PROJECT_TOKENS, TRACE_LABEL, WORKFLOW_TEMPLATE_KIND};
use crate::core::credentials::{CredentialProvider, ProviderFactory, VaultFactory};
use crate::core::domain::{
    Authorization, CredentialToken, GitWorkflowRequest, Identity, ManifestFetchKey, Project,
    ProjectCredentials, ProjectToken, Target, TargetProperties, WorkflowLogs, WorkflowRequest,
    WorkflowStatus,
};
use crate::core::manifest::{normalize_repository, GitCli, GitCredentials, ManifestFetcher};
use crate::core::store::{MemoryStore, ProjectStore};
use crate::core::types::{StringMap, TargetName, WorkflowName};
use crate::core::validation;
use crate::core::workflow::{self, ArgoWorkflow, CancelToken, LogSink, WorkflowEngine};
use crate::error::{Error, ProviderError, Result, ValidationError};

/// Wires the components together for one process.
pub struct Orchestrator {
    admin_secret: String,
    commands: Commands,
    providers: Box<dyn ProviderFactory>,
    engine: Box<dyn WorkflowEngine>,
    fetcher: ManifestFetcher,
    projects: Box<dyn ProjectStore>,
}

impl Orchestrator {
    pub fn new(
        config: &Config,
        providers: Box<dyn ProviderFactory>,
        engine: Box<dyn WorkflowEngine>,
        fetcher: ManifestFetcher,
        projects: Box<dyn ProjectStore>,
    ) -> Self {
        Self {
            admin_secret: config.server.admin_secret.clone(),
            commands: config.commands(),
            providers,
            engine,
            fetcher,
            projects,
        }
    }

    /// Build the production stack: Vault, Argo, the git CLI and the
    /// configured project entries.
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = Box::new(VaultFactory::new(&config.vault));
        let engine = Box::new(ArgoWorkflow::new(&config.argo)?);
        let git = GitCli::new(GitCredentials::from_config(&config.git)?)?;
        let fetcher = ManifestFetcher::new(Box::new(git), config.git.cache_dir());
        let projects = Box::new(MemoryStore::new(config.project_entries()));

        Ok(Self::new(config, providers, engine, fetcher, projects))
    }

    /// Parse the header and require the admin identity.
    fn authorize_admin(&self, header: &str) -> Result<Authorization> {
        let auth = Authorization::parse(header)?;
        auth.require_admin(&self.admin_secret)?;
        Ok(auth)
    }

    fn require_project(&self, provider: &dyn CredentialProvider, project: &str) -> Result<()> {
        if provider.project_exists(project)? {
            Ok(())
        } else {
            Err(Error::not_found("project", project))
        }
    }

    pub fn create_project(&self, header: &str, name: &str) -> Result<ProjectCredentials> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(name)?;

        let provider = self.providers.provider(&auth)?;
        if provider.project_exists(name)? {
            return Err(Error::Conflict(format!("project '{}' already exists", name)));
        }
        provider.create_project(name)
    }

    pub fn get_project(&self, header: &str, name: &str) -> Result<Project> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(name)?;

        self.providers.provider(&auth)?.get_project(name)
    }

    /// Delete a project that owns no targets.
    pub fn delete_project(&self, header: &str, name: &str) -> Result<()> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(name)?;

        let provider = self.providers.provider(&auth)?;
        self.require_project(provider.as_ref(), name)?;

        let targets = provider.list_targets(name)?;
        if !targets.is_empty() {
            return Err(Error::Conflict(format!(
                "project '{}' still has {} target(s), delete them first",
                name,
                targets.len()
            )));
        }
        provider.delete_project(name)
    }

    pub fn create_target(&self, header: &str, project: &str, target: &Target) -> Result<()> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;
        validation::validate_target(target)?;

        let provider = self.providers.provider(&auth)?;
        self.require_project(provider.as_ref(), project)?;
        if provider.target_exists(project, &target.name)? {
            return Err(Error::Conflict(format!(
                "target '{}' already exists",
                target.name
            )));
        }
        provider.create_target(project, target)
    }

    /// Replace an existing target's properties.
    pub fn update_target(
        &self,
        header: &str,
        project: &str,
        name: &str,
        properties: TargetProperties,
    ) -> Result<Target> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;
        validation::validate_target_name(name)?;
        validation::validate_target_properties(&properties)?;

        let provider = self.providers.provider(&auth)?;
        self.require_project(provider.as_ref(), project)?;

        let mut target = provider.get_target(project, name)?;
        target.properties = properties;
        provider.update_target(project, &target)?;
        Ok(target)
    }

    pub fn delete_target(&self, header: &str, project: &str, name: &str) -> Result<()> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;
        validation::validate_target_name(name)?;

        self.providers.provider(&auth)?.delete_target(project, name)
    }

    pub fn get_target(&self, header: &str, project: &str, name: &str) -> Result<Target> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;
        validation::validate_target_name(name)?;

        self.providers.provider(&auth)?.get_target(project, name)
    }

    pub fn list_targets(&self, header: &str, project: &str) -> Result<Vec<TargetName>> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;

        let provider = self.providers.provider(&auth)?;
        self.require_project(provider.as_ref(), project)?;
        provider.list_targets(project)
    }

    /// Issue another SecretID for a project, up to the per-project limit.
    pub fn create_token(&self, header: &str, project: &str) -> Result<ProjectCredentials> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;

        let provider = self.providers.provider(&auth)?;
        self.require_project(provider.as_ref(), project)?;

        let tokens = provider.list_project_tokens(project)?;
        if tokens.len() >= MAX_PROJECT_TOKENS {
            return Err(Error::Conflict(format!(
                "project '{}' already has {} tokens, delete one first",
                project,
                tokens.len()
            )));
        }
        provider.create_token(project)
    }

    pub fn list_project_tokens(&self, header: &str, project: &str) -> Result<Vec<ProjectToken>> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;

        let provider = self.providers.provider(&auth)?;
        self.require_project(provider.as_ref(), project)?;
        provider.list_project_tokens(project)
    }

    pub fn get_project_token(
        &self,
        header: &str,
        project: &str,
        token_id: &str,
    ) -> Result<ProjectToken> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;
        validation::validate_token_id(token_id)?;

        let provider = self.providers.provider(&auth)?;
        self.require_project(provider.as_ref(), project)?;
        provider
            .get_project_token(project, token_id)?
            .ok_or_else(|| Error::not_found("token", token_id))
    }

    /// Revoke a project token. Deleting a token that does not exist succeeds.
    pub fn delete_project_token(&self, header: &str, project: &str, token_id: &str) -> Result<()> {
        let auth = self.authorize_admin(header)?;
        validation::validate_project_name(project)?;
        validation::validate_token_id(token_id)?;

        let provider = self.providers.provider(&auth)?;
        self.require_project(provider.as_ref(), project)?;

        if provider.get_project_token(project, token_id)?.is_none() {
            debug!(project, token_id, "project token already absent");
            return Ok(());
        }
        provider.delete_project_token(project, token_id)
    }

    /// Reject the admin identity, which can never mint a workflow token.
    fn authorize_project(&self, header: &str) -> Result<Authorization> {
        let auth = Authorization::parse(header)?;
        if auth.identity(&self.admin_secret) == Identity::Admin {
            return Err(ProviderError::AdminToken.into());
        }
        Ok(auth)
    }

    /// Validate a request against its framework and render its command.
    ///
    /// Returns the environment string and the rendered command.
    fn render_request(&self, request: &WorkflowRequest) -> Result<(String, String)> {
        let operations = match self.commands.operations(&request.framework) {
            Ok(operations) => operations,
            Err(_) => {
                return Err(ValidationError::new(
                    "framework",
                    format!("must be one of '{}'", self.commands.frameworks().join(" ")),
                )
                .into())
            }
        };
        validation::validate_workflow_request(request, &operations)?;

        let env = environment_string(&request.environment_variables);
        let command = self.commands.render(
            &request.framework,
            &request.operation,
            &env,
            &request.arguments,
        )?;
        debug!(
            framework = %request.framework,
            operation = %request.operation,
            "command rendered"
        );
        Ok((env, command))
    }

    fn submit(
        &self,
        request: &WorkflowRequest,
        env: &str,
        command: &str,
        token: &CredentialToken,
        trace_id: &str,
    ) -> Result<WorkflowName> {
        let parameters = workflow::workflow_parameters(env, command, request, token);
        let mut labels = StringMap::new();
        labels.insert(TRACE_LABEL.to_string(), trace_id.to_string());

        let template_ref = format!(
            "{}/{}",
            WORKFLOW_TEMPLATE_KIND, request.workflow_template_name
        );
        let name = self.engine.submit(&template_ref, &parameters, &labels)?;

        info!(
            workflow = %name,
            project = %request.project_name,
            target = %request.target_name,
            trace_id,
            "workflow created"
        );
        Ok(name)
    }

    /// Validate, render, mint a token and submit.
    pub fn create_workflow(
        &self,
        header: &str,
        request: &WorkflowRequest,
        trace_id: &str,
    ) -> Result<WorkflowName> {
        let auth = self.authorize_project(header)?;
        let (env, command) = self.render_request(request)?;

        let provider = self.providers.provider(&auth)?;
        let token = provider.get_token()?;
        self.require_project(provider.as_ref(), &request.project_name)?;

        self.submit(request, &env, &command, &token, trace_id)
    }

    /// Run the manifest at `request.path`/`request.commit_hash` from the
    /// project's registered repository.
    ///
    /// The caller's identity is confirmed by minting its token before any
    /// git operation. The manifest names the target.
    pub fn create_workflow_from_git(
        &self,
        header: &str,
        project: &str,
        request: &GitWorkflowRequest,
        trace_id: &str,
    ) -> Result<WorkflowName> {
        let auth = self.authorize_project(header)?;
        validation::validate_project_name(project)?;
        validation::validate_git_request(request)?;

        let provider = self.providers.provider(&auth)?;
        let token = provider.get_token()?;
        self.require_project(provider.as_ref(), project)?;

        let repository = self
            .projects
            .get(project)?
            .map(|entry| entry.repository)
            .ok_or_else(|| Error::not_found("project", project))?;
        if let Some(requested) = &request.repository {
            if normalize_repository(requested) != normalize_repository(&repository) {
                return Err(ValidationError::new(
                    "repository",
                    "must be the repository registered for the project",
                )
                .into());
            }
        }

        let bytes = self.fetcher.get_manifest_file(&ManifestFetchKey {
            repository,
            commit_hash: request.commit_hash.clone(),
            path: request.path.clone(),
        })?;
        let mut manifest = WorkflowRequest::from_yaml(&bytes)?;

        if manifest.project_name != project {
            return Err(ValidationError::new(
                "project_name",
                format!("in manifest must match '{}'", project),
            )
            .into());
        }
        manifest.operation = request.operation.clone();

        let (env, command) = self.render_request(&manifest)?;
        self.submit(&manifest, &env, &command, &token, trace_id)
    }

    pub fn workflow_status(&self, name: &str) -> Result<WorkflowStatus> {
        self.engine.status(name)
    }

    pub fn workflow_logs(&self, name: &str) -> Result<WorkflowLogs> {
        self.engine.logs(name)
    }

    pub fn stream_workflow_logs(
        &self,
        name: &str,
        cancel: &CancelToken,
        sink: &mut LogSink<'_>,
    ) -> Result<()> {
        self.engine.log_stream(name, cancel, sink)
    }

    /// Workflows submitted for `project`/`target`.
    pub fn list_workflows(&self, project: &str, target: &str) -> Result<Vec<WorkflowStatus>> {
        validation::validate_project_name(project)?;
        validation::validate_target_name(target)?;

        let workflows = self.engine.list()?;
        Ok(workflow::filter_by_target(workflows, project, target))
    }

    /// Check the credential backend.
    pub fn health(&self) -> Result<()> {
        self.providers.health()
    }
}
