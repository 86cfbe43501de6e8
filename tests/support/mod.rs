//! Test support utilities for bullpen integration tests.
//!
//! Provides an isolated working directory, config file writers and helper
//! commands for driving the binary.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with an isolated temp directory.
///
/// Child processes use `.current_dir()` and an explicit `--config`, so
/// tests can safely run in parallel.
pub struct Test {
    /// Working directory for the binary
    pub dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Write `bullpen.toml` pointing at the given backends.
    pub fn with_config(vault: &str, argo: &str) -> Self {
        let t = Self::new();
        let cache = t.dir.path().join("cache");
        std::fs::write(t.config_path(), config_toml(vault, argo, &cache))
            .expect("failed to write config");
        t
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("bullpen.toml")
    }

    /// Write `contents` to a file in the working directory.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }
}
