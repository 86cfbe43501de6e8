//! Project token administration commands.

use crate::cli::output;
use crate::core::orchestrator::Orchestrator;
use crate::error::Result;

/// Issue another SecretID and print it with its token id.
pub fn create(orchestrator: &Orchestrator, auth: &str, project: &str) -> Result<()> {
    let credentials = orchestrator.create_token(auth, project)?;
    output::json(&credentials)?;
    output::success(&format!("token {} created for {}", credentials.token_id(), project));
    output::warn("secret_id is shown only once, store it now");
    Ok(())
}

pub fn get(orchestrator: &Orchestrator, auth: &str, project: &str, token_id: &str) -> Result<()> {
    output::json(&orchestrator.get_project_token(auth, project, token_id)?)
}

pub fn delete(orchestrator: &Orchestrator, auth: &str, project: &str, token_id: &str) -> Result<()> {
    orchestrator.delete_project_token(auth, project, token_id)?;
    output::success(&format!("token {} deleted from {}", token_id, project));
    Ok(())
}

pub fn list(orchestrator: &Orchestrator, auth: &str, project: &str) -> Result<()> {
    let tokens = orchestrator.list_project_tokens(auth, project)?;
    if tokens.is_empty() {
        output::dimmed(&format!("no tokens in {}", project));
    }
    output::json(&tokens)
}
