//! Project administration commands.

use crate::cli::output;
use crate::core::orchestrator::Orchestrator;
use crate::error::Result;

/// Create a project and print its machine identity.
pub fn create(orchestrator: &Orchestrator, auth: &str, name: &str) -> Result<()> {
    let credentials = orchestrator.create_project(auth, name)?;
    output::json(&credentials)?;
    output::success(&format!("project {} created", name));
    output::warn("secret_id is shown only once, store it now");
    Ok(())
}

pub fn get(orchestrator: &Orchestrator, auth: &str, name: &str) -> Result<()> {
    output::json(&orchestrator.get_project(auth, name)?)
}

pub fn delete(orchestrator: &Orchestrator, auth: &str, name: &str) -> Result<()> {
    orchestrator.delete_project(auth, name)?;
    output::success(&format!("project {} deleted", name));
    Ok(())
}
