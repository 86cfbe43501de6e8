//! Health command.

use crate::cli::output;
use crate::core::orchestrator::Orchestrator;
use crate::error::Result;

/// Check that the credential backend answers.
pub fn execute(orchestrator: &Orchestrator) -> Result<()> {
    orchestrator.health()?;
    output::success("credential backend healthy");
    Ok(())
}
