//! In-memory project store built from configuration.

use std::collections::BTreeMap;

use tracing::trace;

use super::ProjectStore;
use crate::core::domain::ProjectEntry;
use crate::core::types::ProjectName;
use crate::error::Result;

/// Project entries held in memory, usually from `[projects.<name>]` tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<ProjectName, ProjectEntry>,
}

impl MemoryStore {
    pub fn new(entries: impl IntoIterator<Item = ProjectEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }
}

impl ProjectStore for MemoryStore {
    fn get(&self, project: &str) -> Result<Option<ProjectEntry>> {
        trace!(project, "project store lookup");
        Ok(self.entries.get(project).cloned())
    }
}
