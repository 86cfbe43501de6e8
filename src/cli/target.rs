//! Target administration commands.

use crate::cli::output;
use crate::core::domain::{Target, TargetProperties};
use crate::core::orchestrator::Orchestrator;
use crate::error::Result;

pub fn create(
    orchestrator: &Orchestrator,
    auth: &str,
    project: &str,
    name: &str,
    kind: String,
    properties: TargetProperties,
) -> Result<()> {
    let target = Target {
        name: name.to_string(),
        kind,
        properties,
    };
    orchestrator.create_target(auth, project, &target)?;
    output::success(&format!("target {} created in {}", name, project));
    Ok(())
}

/// Replace a target's properties and print the result.
pub fn update(
    orchestrator: &Orchestrator,
    auth: &str,
    project: &str,
    name: &str,
    properties: TargetProperties,
) -> Result<()> {
    let target = orchestrator.update_target(auth, project, name, properties)?;
    output::json(&target)?;
    output::success(&format!("target {} updated", name));
    Ok(())
}

pub fn get(orchestrator: &Orchestrator, auth: &str, project: &str, name: &str) -> Result<()> {
    output::json(&orchestrator.get_target(auth, project, name)?)
}

pub fn delete(orchestrator: &Orchestrator, auth: &str, project: &str, name: &str) -> Result<()> {
    orchestrator.delete_target(auth, project, name)?;
    output::success(&format!("target {} deleted from {}", name, project));
    Ok(())
}

pub fn list(orchestrator: &Orchestrator, auth: &str, project: &str) -> Result<()> {
    let targets = orchestrator.list_targets(auth, project)?;
    if targets.is_empty() {
        output::dimmed(&format!("no targets in {}", project));
    }
    output::json(&targets)
}
