//! Tests for error handling and CLI flags.

use crate::skip_without_git;
use crate::support::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    let output = t.cmd().arg("--help").output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    for command in ["project", "target", "workflow", "health", "completions"] {
        assert!(out.contains(command), "help missing {}: {}", command, out);
    }
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.cmd().arg("--version").output().unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("bullpen"));
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    let output = t.cmd().arg("unknown-command").output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_completions_bash() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("bullpen"));
}

#[test]
fn test_missing_config_hints() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["--config", "missing.toml", "project", "get", "payments"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "config file not found");
    assert_stderr_contains(&output, "--config");
}

#[test]
fn test_config_from_env() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("BULLPEN_CONFIG", "elsewhere.toml")
        .args(["health"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "elsewhere.toml");
}

#[test]
fn test_short_admin_secret_rejected() {
    let t = Test::with_config("http://127.0.0.1:8200", "http://127.0.0.1:2746");
    let contents = std::fs::read_to_string(t.config_path()).unwrap();
    t.write(
        "bullpen.toml",
        &contents.replace(ADMIN_SECRET, "short"),
    );

    let output = t.run(ADMIN_AUTH, &["health"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "server.admin_secret");
}

#[test]
fn test_malformed_auth() {
    skip_without_git!();
    let t = Test::with_config("http://127.0.0.1:1", "http://127.0.0.1:1");

    let output = t.run("garbage", &["project", "get", "payments"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid authorization header");
    assert_stderr_contains(&output, "BULLPEN_AUTH");
}

#[test]
fn test_health() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let health = server.mock("GET", "/v1/sys/health").with_status(200).create();
    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");

    let output = t.run(ADMIN_AUTH, &["health"]);
    assert_success(&output);
    assert_stderr_contains(&output, "healthy");
    health.assert();
}

#[test]
fn test_unhealthy_backend_fails() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _sealed = server.mock("GET", "/v1/sys/health").with_status(503).create();
    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");

    let output = t.run(ADMIN_AUTH, &["health"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "503");
}
