//! Tests for `bullpen token`.

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

use crate::skip_without_git;
use crate::support::*;

const ROLE_PATH: &str = "/v1/auth/approle/role/bullpen-projects-payments";

fn login(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/v1/auth/approle/login")
        .with_status(200)
        .with_body(format!(r#"{{"auth":{{"client_token":"{}"}}}}"#, SERVICE_TOKEN))
        .create()
}

fn existing_project(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", ROLE_PATH)
        .with_status(200)
        .with_body(r#"{"data":{"token_num_uses":3}}"#)
        .create()
}

fn secret_ids(server: &mut ServerGuard, keys: &[&str]) -> Mock {
    server
        .mock("GET", format!("{}/secret-id", ROLE_PATH).as_str())
        .match_query(Matcher::UrlEncoded("list".into(), "true".into()))
        .with_status(200)
        .with_body(json!({ "data": { "keys": keys } }).to_string())
        .create()
}

#[test]
fn test_token_create_prints_credentials() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _login = login(&mut server);
    let _project = existing_project(&mut server);
    let _list = secret_ids(&mut server, &["acc-1"]);
    let secret = server
        .mock("POST", format!("{}/secret-id", ROLE_PATH).as_str())
        .match_header("x-vault-token", SERVICE_TOKEN)
        .with_status(200)
        .with_body(r#"{"data":{"secret_id":"sid-2","secret_id_accessor":"acc-2"}}"#)
        .create();
    let _role_id = server
        .mock("GET", format!("{}/role-id", ROLE_PATH).as_str())
        .with_status(200)
        .with_body(r#"{"data":{"role_id":"rid-456"}}"#)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["token", "create", "payments"]);
    assert_success(&output);

    let creds = stdout_json(&output);
    assert_eq!(creds["role_id"], "rid-456");
    assert_eq!(creds["secret_id"], "sid-2");
    assert_eq!(creds["token_id"], "acc-2");
    assert_stderr_contains(&output, "shown only once");
    secret.assert();
}

#[test]
fn test_token_create_limit() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _login = login(&mut server);
    let _project = existing_project(&mut server);
    let _list = secret_ids(&mut server, &["acc-1", "acc-2"]);
    let secret = server
        .mock("POST", format!("{}/secret-id", ROLE_PATH).as_str())
        .expect(0)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["token", "create", "payments"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "already has 2 tokens");
    secret.assert();
}

#[test]
fn test_token_delete_destroys_accessor() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _login = login(&mut server);
    let _project = existing_project(&mut server);
    let _lookup = server
        .mock(
            "POST",
            format!("{}/secret-id-accessor/lookup", ROLE_PATH).as_str(),
        )
        .match_body(Matcher::Json(json!({ "secret_id_accessor": "acc-1" })))
        .with_status(200)
        .with_body(r#"{"data":{"secret_id_accessor":"acc-1"}}"#)
        .create();
    let destroy = server
        .mock(
            "POST",
            format!("{}/secret-id-accessor/destroy", ROLE_PATH).as_str(),
        )
        .match_body(Matcher::Json(json!({ "secret_id_accessor": "acc-1" })))
        .with_status(204)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["token", "delete", "payments", "acc-1"]);
    assert_success(&output);
    destroy.assert();
}

#[test]
fn test_token_requires_admin() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let login = server
        .mock("POST", "/v1/auth/approle/login")
        .expect(0)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(PROJECT_AUTH, &["token", "list", "payments"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "must be an authorized admin");
    login.assert();
}
