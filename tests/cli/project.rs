//! Tests for `bullpen project`.

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

use crate::skip_without_git;
use crate::support::*;

const ROLE_PATH: &str = "/v1/auth/approle/role/bullpen-projects-payments";

fn login(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/v1/auth/approle/login")
        .match_body(Matcher::Json(json!({
            "role_id": "service-role",
            "secret_id": "service-secret",
        })))
        .with_status(200)
        .with_body(format!(r#"{{"auth":{{"client_token":"{}"}}}}"#, SERVICE_TOKEN))
        .create()
}

#[test]
fn test_project_create_prints_credentials() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let login = login(&mut server);
    let _missing = server.mock("GET", ROLE_PATH).with_status(404).create();
    let policy = server
        .mock("PUT", "/v1/sys/policies/acl/bullpen-projects-payments")
        .match_header("x-vault-token", SERVICE_TOKEN)
        .with_status(204)
        .create();
    let role = server
        .mock("POST", ROLE_PATH)
        .match_body(Matcher::PartialJson(json!({
            "token_policies": "bullpen-projects-payments",
            "token_no_default_policy": true,
        })))
        .with_status(204)
        .create();
    let _secret = server
        .mock("POST", format!("{}/secret-id", ROLE_PATH).as_str())
        .with_status(200)
        .with_body(r#"{"data":{"secret_id":"sid-123","secret_id_accessor":"acc-789"}}"#)
        .create();
    let _role_id = server
        .mock("GET", format!("{}/role-id", ROLE_PATH).as_str())
        .with_status(200)
        .with_body(r#"{"data":{"role_id":"rid-456"}}"#)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["project", "create", "payments"]);
    assert_success(&output);

    let creds = stdout_json(&output);
    assert_eq!(creds["role_id"], "rid-456");
    assert_eq!(creds["secret_id"], "sid-123");
    assert_eq!(creds["token_id"], "acc-789");
    assert_stderr_contains(&output, "shown only once");

    login.assert();
    policy.assert();
    role.assert();
}

#[test]
fn test_project_create_existing_conflicts() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _login = login(&mut server);
    let _exists = server
        .mock("GET", ROLE_PATH)
        .with_status(200)
        .with_body(r#"{"data":{"token_num_uses":3}}"#)
        .create();
    let policy = server
        .mock("PUT", "/v1/sys/policies/acl/bullpen-projects-payments")
        .expect(0)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["project", "create", "payments"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "already exists");
    policy.assert();
}

#[test]
fn test_project_invalid_name_never_reaches_backend() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let login = server
        .mock("POST", "/v1/auth/approle/login")
        .expect(0)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["project", "create", "pay-ments"]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(2));
    assert_stderr_contains(&output, "project_name must be alpha-numeric");
    login.assert();
}

#[test]
fn test_project_requires_admin() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let login = server
        .mock("POST", "/v1/auth/approle/login")
        .expect(0)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(PROJECT_AUTH, &["project", "delete", "payments"]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(3));
    assert_stderr_contains(&output, "must be an authorized admin");
    login.assert();
}

#[test]
fn test_project_get_missing() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _login = login(&mut server);
    let _missing = server.mock("GET", ROLE_PATH).with_status(404).create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["project", "get", "payments"]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(4));
    assert_stderr_contains(&output, "project 'payments' not found");
}
