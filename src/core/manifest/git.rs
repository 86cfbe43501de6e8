//! `git` CLI backend.
//!
//! ## Requirements
//!
//! - `git` must be on `PATH`
//! - SSH auth needs a private key file readable by the service
//! - HTTPS auth sends basic credentials through `http.extraHeader`
//!
//! Credentials are passed through `GIT_CONFIG_*` environment entries and
//! never land in argv or in the working copy's `.git/config`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use base64::Engine;
use tracing::trace;
use zeroize::Zeroizing;

use super::GitBackend;
use crate::core::config::{GitAuth, GitConfig};
use crate::error::{ConfigError, FetchError, Result};

/// How git authenticates to remotes.
pub enum GitCredentials {
    None,
    Ssh { key: PathBuf },
    Https { user: String, pass: Zeroizing<String> },
}

impl GitCredentials {
    /// Build credentials from the `[git]` config section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when the selected mode lacks its settings.
    pub fn from_config(config: &GitConfig) -> Result<Self> {
        match config.auth {
            GitAuth::None => Ok(Self::None),
            GitAuth::Ssh => {
                let key = config
                    .ssh_key
                    .clone()
                    .ok_or(ConfigError::MissingField {
                        field: "git.ssh_key",
                    })?;
                Ok(Self::Ssh { key })
            }
            GitAuth::Https => {
                let user = config
                    .https_user
                    .clone()
                    .ok_or(ConfigError::MissingField {
                        field: "git.https_user",
                    })?;
                let pass = config
                    .https_pass
                    .clone()
                    .ok_or(ConfigError::MissingField {
                        field: "git.https_pass",
                    })?;
                Ok(Self::Https {
                    user,
                    pass: Zeroizing::new(pass),
                })
            }
        }
    }
}

/// Drives the `git` executable.
pub struct GitCli {
    program: PathBuf,
    credentials: GitCredentials,
}

impl GitCli {
    /// Locate `git` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::GitUnavailable` if `git` cannot be found.
    pub fn new(credentials: GitCredentials) -> Result<Self> {
        let program = which::which("git").map_err(|_| FetchError::GitUnavailable)?;
        Ok(Self {
            program,
            credentials,
        })
    }

    fn command(&self, dir: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        // Never block on an interactive prompt.
        cmd.env("GIT_TERMINAL_PROMPT", "0");

        match &self.credentials {
            GitCredentials::None => {}
            GitCredentials::Ssh { key } => {
                cmd.env(
                    "GIT_SSH_COMMAND",
                    format!(
                        "ssh -i '{}' -o IdentitiesOnly=yes -o BatchMode=yes -o StrictHostKeyChecking=accept-new",
                        key.display()
                    ),
                );
            }
            GitCredentials::Https { user, pass } => {
                let basic = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", user, pass.as_str()));
                cmd.env("GIT_CONFIG_COUNT", "1")
                    .env("GIT_CONFIG_KEY_0", "http.extraHeader")
                    .env("GIT_CONFIG_VALUE_0", format!("Authorization: Basic {}", basic));
            }
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn run(&self, operation: &'static str, dir: Option<&Path>, args: &[&str]) -> Result<()> {
        trace!(operation, ?args, "running git");

        let output = self
            .command(dir)
            .args(args)
            .output()
            .map_err(|e| FetchError::Git {
                operation,
                message: format!("failed to spawn git: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Git {
                operation,
                message: stderr.trim().to_string(),
            }
            .into());
        }

        trace!(operation, "git finished");
        Ok(())
    }
}

/// Revision that only resolves to a commit object.
fn commit_revision(commit: &str) -> String {
    format!("{}^{{commit}}", commit)
}

impl GitBackend for GitCli {
    fn clone_repo(&self, repository: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy();
        self.run("clone", None, &["clone", "--quiet", "--", repository, &dest])
    }

    fn fetch(&self, dir: &Path) -> Result<()> {
        self.run("fetch", Some(dir), &["fetch", "--quiet", "--prune", "origin"])
    }

    fn checkout(&self, dir: &Path, commit: &str) -> Result<()> {
        let revision = commit_revision(commit);
        self.run(
            "checkout",
            Some(dir),
            &["checkout", "--quiet", "--force", "--detach", &revision],
        )
    }
}
