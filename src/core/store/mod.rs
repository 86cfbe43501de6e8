//! Project metadata store.
//!
//! The relational metadata store lives outside this crate; the orchestrator
//! only needs to resolve a project's manifest repository through it.
//!
//! ## Adding a New Store
//!
//! 1. Implement the `ProjectStore` trait
//! 2. Add the implementation in a new file (e.g., `postgres.rs`)
//! 3. Re-export from this module

use crate::core::domain::ProjectEntry;
use crate::error::Result;

mod memory;

pub use memory::MemoryStore;

/// Read access to project metadata.
pub trait ProjectStore: Send + Sync {
    /// Look up a project entry.
    ///
    /// # Returns
    ///
    /// `None` when the store has no record of the project.
    ///
    /// # Errors
    ///
    /// Returns an error if the store itself cannot be read.
    fn get(&self, project: &str) -> Result<Option<ProjectEntry>>;
}
