//! Tests for `bullpen workflow`.

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

use crate::skip_without_git;
use crate::support::*;

/// Service login, the project's own login and an existing `payments` project.
fn vault(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        server
            .mock("POST", "/v1/auth/approle/login")
            .match_body(Matcher::PartialJson(json!({ "role_id": "service-role" })))
            .with_status(200)
            .with_body(format!(r#"{{"auth":{{"client_token":"{}"}}}}"#, SERVICE_TOKEN))
            .create(),
        server
            .mock("POST", "/v1/auth/approle/login")
            .match_body(Matcher::Json(json!({
                "role_id": "role-payments",
                "secret_id": "secret-payments",
            })))
            .with_status(200)
            .with_body(r#"{"auth":{"client_token":"hvs.workflow"}}"#)
            .create(),
        server
            .mock("GET", "/v1/auth/approle/role/bullpen-projects-payments")
            .with_status(200)
            .with_body(r#"{"data":{}}"#)
            .create(),
    ]
}

#[test]
fn test_workflow_create_submits_template() {
    skip_without_git!();
    let mut vault_server = mockito::Server::new();
    let _vault = vault(&mut vault_server);
    let mut argo = mockito::Server::new();
    let submit = argo
        .mock("POST", "/api/v1/workflows/argo/submit")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "namespace": "argo",
                "resourceKind": "workflowtemplate",
                "resourceName": "bullpen-single-step",
            })),
            Matcher::Regex("payments-prod_account-".to_string()),
            Matcher::Regex("credentials_token=hvs.workflow".to_string()),
            Matcher::Regex(
                "execute_command=env TF_LOG=info terraform init -upgrade".to_string(),
            ),
            Matcher::Regex("x-b3-traceid=".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"metadata":{"name":"Payments-Prod_Account-AB12C"}}"#)
        .create();

    let t = Test::with_config(&vault_server.url(), &argo.url());
    let request = t.write("request.json", SAMPLE_REQUEST);
    let output = t.run(
        PROJECT_AUTH,
        &["workflow", "create", request.to_str().unwrap()],
    );
    assert_success(&output);
    assert_eq!(
        stdout_json(&output),
        json!({ "workflow_name": "payments-prod_account-ab12c" })
    );
    submit.assert();
}

#[test]
fn test_workflow_create_unknown_operation_never_submits() {
    skip_without_git!();
    let mut argo = mockito::Server::new();
    let submit = argo
        .mock("POST", "/api/v1/workflows/argo/submit")
        .expect(0)
        .create();

    let t = Test::with_config("http://127.0.0.1:1", &argo.url());
    let request = t.write(
        "request.json",
        &SAMPLE_REQUEST.replace(r#""type": "sync""#, r#""type": "destroy""#),
    );
    let output = t.run(
        PROJECT_AUTH,
        &["workflow", "create", request.to_str().unwrap()],
    );
    assert_failure(&output);
    assert_stderr_contains(&output, "type must be one of 'diff sync'");
    submit.assert();
}

#[test]
fn test_workflow_status() {
    skip_without_git!();
    let mut argo = mockito::Server::new();
    let _status = argo
        .mock("GET", "/api/v1/workflows/argo/payments-prod_account-ab12c")
        .with_status(200)
        .with_body(
            r#"{"metadata":{"name":"payments-prod_account-ab12c","creationTimestamp":"2023-11-14T22:13:20Z"},
                "status":{"phase":"Succeeded","finishedAt":"2023-11-14T22:15:00Z"}}"#,
        )
        .create();

    let t = Test::with_config("http://127.0.0.1:1", &argo.url());
    let output = t.run(
        PROJECT_AUTH,
        &["workflow", "status", "payments-prod_account-ab12c"],
    );
    assert_success(&output);
    assert_eq!(
        stdout_json(&output),
        json!({
            "name": "payments-prod_account-ab12c",
            "status": "succeeded",
            "created": "1700000000",
            "finished": "1700000100",
        })
    );
}

#[test]
fn test_workflow_status_not_found() {
    skip_without_git!();
    let mut argo = mockito::Server::new();
    let _missing = argo
        .mock("GET", "/api/v1/workflows/argo/nope")
        .with_status(404)
        .with_body(r#"{"code":5,"message":"not found"}"#)
        .create();

    let t = Test::with_config("http://127.0.0.1:1", &argo.url());
    let output = t.run(PROJECT_AUTH, &["workflow", "status", "nope"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "workflow 'nope' not found");
}

#[test]
fn test_workflow_logs() {
    skip_without_git!();
    let mut argo = mockito::Server::new();
    let _logs = argo
        .mock("GET", "/api/v1/workflows/argo/wf-1/log")
        .match_query(Matcher::UrlEncoded(
            "logOptions.container".into(),
            "main".into(),
        ))
        .with_status(200)
        .with_body(concat!(
            r#"{"result":{"content":"Initializing...","podName":"wf-1-main"}}"#,
            "\n",
            r#"{"result":{"content":"Apply complete!","podName":"wf-1-main"}}"#,
            "\n",
        ))
        .create();

    let t = Test::with_config("http://127.0.0.1:1", &argo.url());
    let output = t.run(PROJECT_AUTH, &["workflow", "logs", "wf-1"]);
    assert_success(&output);
    assert_eq!(
        stdout(&output),
        "wf-1-main: Initializing...\nwf-1-main: Apply complete!\n"
    );
}
