//! Execution command rendering.
//!
//! Each framework maps operation types to a command template. Templates
//! reference three variables with `{{.Name}}` placeholders:
//!
//! - `{{.EnvironmentVariables}}`: the serialized environment (see [`environment_string`])
//! - `{{.InitArguments}}`: the `init` argument group, space-joined
//! - `{{.ExecuteArguments}}`: the `execute` argument group, space-joined

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::core::constants::{ARGS_EXECUTE, ARGS_INIT};
use crate::core::types::{Arguments, Framework, OperationTemplates, StringMap};
use crate::error::{CommandError, Result};

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

const VAR_ENVIRONMENT: &str = "EnvironmentVariables";
const VAR_INIT: &str = "InitArguments";
const VAR_EXECUTE: &str = "ExecuteArguments";

/// Serialize environment variables as `env K1=V1 K2=V2`, keys sorted.
///
/// Returns an empty string when there are no variables so templates can
/// place it unconditionally.
pub fn environment_string(vars: &StringMap) -> String {
    if vars.is_empty() {
        return String::new();
    }
    let mut out = String::from("env");
    for (key, value) in vars {
        out.push(' ');
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

/// Command templates keyed by framework, then operation type.
#[derive(Debug, Clone, Default)]
pub struct Commands {
    templates: BTreeMap<Framework, OperationTemplates>,
}

impl Commands {
    pub fn new(templates: BTreeMap<Framework, OperationTemplates>) -> Self {
        Self { templates }
    }

    /// Configured framework names, sorted.
    pub fn frameworks(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    /// Operation types configured for `framework`, sorted.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnknownFramework` if the framework is not configured.
    pub fn operations(&self, framework: &str) -> Result<Vec<String>> {
        Ok(self.framework(framework)?.keys().cloned().collect())
    }

    fn framework(&self, framework: &str) -> Result<&OperationTemplates> {
        self.templates
            .get(framework)
            .ok_or_else(|| CommandError::UnknownFramework(framework.to_string()).into())
    }

    fn template(&self, framework: &str, operation: &str) -> Result<&str> {
        self.framework(framework)?
            .get(operation)
            .map(String::as_str)
            .ok_or_else(|| CommandError::UnknownOperation(operation.to_string()).into())
    }

    /// Render the command for `framework`/`operation`.
    ///
    /// # Arguments
    ///
    /// * `env_string` - Pre-serialized environment, usually from [`environment_string`]
    /// * `arguments` - Argument groups; a missing group renders as empty
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnknownFramework` or `CommandError::UnknownOperation`
    /// naming the missing key, or `CommandError::UnknownVariable` if the
    /// template references anything but the three supported variables.
    pub fn render(
        &self,
        framework: &str,
        operation: &str,
        env_string: &str,
        arguments: &Arguments,
    ) -> Result<String> {
        let template = self.template(framework, operation)?;
        debug!(framework, operation, "rendering command");

        let init = join_group(arguments, ARGS_INIT);
        let execute = join_group(arguments, ARGS_EXECUTE);
        render_template(template, env_string, &init, &execute)
    }

    /// Check that every configured template only references known variables.
    pub fn check(&self) -> Result<()> {
        for operations in self.templates.values() {
            for template in operations.values() {
                render_template(template, "", "", "")?;
            }
        }
        Ok(())
    }
}

fn join_group(arguments: &Arguments, group: &str) -> String {
    arguments
        .get(group)
        .map(|args| args.join(" "))
        .unwrap_or_default()
}

fn render_template(template: &str, env: &str, init: &str, execute: &str) -> Result<String> {
    if let Some(unknown) = RE_PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|name| !matches!(name.as_str(), VAR_ENVIRONMENT | VAR_INIT | VAR_EXECUTE))
    {
        return Err(CommandError::UnknownVariable(unknown).into());
    }

    let rendered = RE_PLACEHOLDER.replace_all(template, |caps: &Captures| match &caps[1] {
        VAR_ENVIRONMENT => env.to_string(),
        VAR_INIT => init.to_string(),
        _ => execute.to_string(),
    });
    Ok(rendered.into_owned())
}
