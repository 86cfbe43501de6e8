//! Tests for `bullpen target`.

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

use crate::skip_without_git;
use crate::support::*;

const TARGET_PATH: &str = "/v1/aws/roles/bullpen-projects-payments-target-prod_account";

/// Mocks for the service login and an existing `payments` project.
fn project_exists(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        server
            .mock("POST", "/v1/auth/approle/login")
            .with_status(200)
            .with_body(format!(r#"{{"auth":{{"client_token":"{}"}}}}"#, SERVICE_TOKEN))
            .create(),
        server
            .mock("GET", "/v1/auth/approle/role/bullpen-projects-payments")
            .with_status(200)
            .with_body(r#"{"data":{}}"#)
            .create(),
    ]
}

#[test]
fn test_target_create_writes_role() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _project = project_exists(&mut server);
    let write = server
        .mock("POST", TARGET_PATH)
        .match_body(Matcher::Json(json!({
            "credential_type": "assumed_role",
            "policy_arns": ["arn:aws:iam::aws:policy/ReadOnlyAccess"],
            "policy_document": "",
            "role_arns": [ROLE_ARN],
        })))
        .with_status(204)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(
        ADMIN_AUTH,
        &[
            "target",
            "create",
            "payments",
            "prod_account",
            "--role-arn",
            ROLE_ARN,
            "--policy-arn",
            "arn:aws:iam::aws:policy/ReadOnlyAccess",
        ],
    );
    assert_success(&output);
    write.assert();
}

#[test]
fn test_target_create_rejects_six_policies() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let login = server
        .mock("POST", "/v1/auth/approle/login")
        .expect(0)
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let mut args = vec![
        "target",
        "create",
        "payments",
        "prod_account",
        "--role-arn",
        ROLE_ARN,
    ];
    let arns: Vec<String> = (0..6)
        .map(|i| format!("arn:aws:iam::aws:policy/P{}", i))
        .collect();
    for arn in &arns {
        args.push("--policy-arn");
        args.push(arn);
    }

    let output = t.run(ADMIN_AUTH, &args);
    assert_failure(&output);
    assert_stderr_contains(&output, "cannot contain more than 5 entries");
    login.assert();
}

#[test]
fn test_target_get_prints_json() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _project = project_exists(&mut server);
    let _read = server
        .mock("GET", TARGET_PATH)
        .with_status(200)
        .with_body(
            json!({
                "data": {
                    "credential_type": "assumed_role",
                    "policy_arns": [],
                    "role_arns": [ROLE_ARN],
                }
            })
            .to_string(),
        )
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["target", "get", "payments", "prod_account"]);
    assert_success(&output);

    let target = stdout_json(&output);
    assert_eq!(target["name"], "prod_account");
    assert_eq!(target["type"], "aws_account");
    assert_eq!(target["properties"]["role_arn"], ROLE_ARN);
}

#[test]
fn test_target_list() {
    skip_without_git!();
    let mut server = mockito::Server::new();
    let _project = project_exists(&mut server);
    let _list = server
        .mock("GET", "/v1/aws/roles/")
        .match_query(Matcher::UrlEncoded("list".into(), "true".into()))
        .with_status(200)
        .with_body(
            r#"{"data":{"keys":[
                "bullpen-projects-payments-target-prod_account",
                "bullpen-projects-payments-target-staging",
                "bullpen-projects-ledger-target-prod_account"
            ]}}"#,
        )
        .create();

    let t = Test::with_config(&server.url(), "http://127.0.0.1:1");
    let output = t.run(ADMIN_AUTH, &["target", "list", "payments"]);
    assert_success(&output);
    assert_eq!(stdout_json(&output), json!(["prod_account", "staging"]));
}
