//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

/// Environment variables that would leak host settings into a test run.
const HOST_VARS: &[&str] = &[
    "BULLPEN_AUTH",
    "BULLPEN_CONFIG",
    "BULLPEN_LOG",
    "BULLPEN_LOG_FORMAT",
    "BULLPEN_ADMIN_SECRET",
    "BULLPEN_VAULT_ADDR",
    "BULLPEN_VAULT_ROLE",
    "BULLPEN_VAULT_SECRET",
    "BULLPEN_ARGO_ADDR",
    "BULLPEN_ARGO_NAMESPACE",
    "BULLPEN_ARGO_TOKEN",
    "BULLPEN_GIT_AUTH",
    "BULLPEN_CACHE_DIR",
];

impl Test {
    /// Create a bullpen command running in the test directory.
    ///
    /// Host `BULLPEN_*` settings are cleared and `NO_COLOR` is set.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("bullpen").expect("failed to find bullpen binary");
        for var in HOST_VARS {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run bullpen with this test's config and the given authorization.
    pub fn run(&self, auth: &str, args: &[&str]) -> Output {
        self.cmd()
            .arg("--config")
            .arg(self.config_path())
            .args(["--auth", auth])
            .args(args)
            .output()
            .expect("failed to run bullpen")
    }
}
