use std::collections::HashMap;

use httpmock::prelude::*;
use planetscale_provider::client::{ApiError, Client, PlanetScaleApi};
use planetscale_provider::config::{Credentials, ResolvedConfig};
use planetscale_provider::models::{CreateDatabaseRequest, CreatePasswordRequest};
use planetscale_provider::{PlanetScaleProvider, ProviderError, ProviderService};
use serde_json::json;
use url::Url;

fn client(server: &MockServer) -> Client {
    client_at(&server.url("/"))
}

fn client_at(url: &str) -> Client {
    Client::new(&ResolvedConfig {
        credentials: Credentials::new("token-id", "token-secret"),
        api_url: Url::parse(url).unwrap(),
    })
    .unwrap()
}

#[tokio::test]
async fn get_database_sends_service_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organizations/acme/databases/mydb")
                .header("authorization", "token-id:token-secret")
                .header("accept", "application/json");
            then.status(200).json_body(json!({
                "id": "db1",
                "name": "mydb",
                "notes": "primary",
                "state": "ready",
                "html_url": "https://app.planetscale.com/acme/mydb",
                "region": {"slug": "eu-west", "display_name": "AWS eu-west-1", "enabled": true}
            }));
        })
        .await;

    let database = client(&server).get_database("acme", "mydb").await.unwrap();

    mock.assert_async().await;
    assert_eq!(database.name, "mydb");
    assert_eq!(database.notes, "primary");
    assert_eq!(database.region.slug, "eu-west");
    assert_eq!(database.region.name, "AWS eu-west-1");
}

#[tokio::test]
async fn list_branches_unwraps_data() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organizations/acme/databases/mydb/branches");
            then.status(200).json_body(json!({
                "type": "list",
                "current_page": 1,
                "data": [
                    {"name": "main", "production": true, "ready": true, "region": {"slug": "us-east"}},
                    {"name": "dev", "parent_branch": "main", "region": {"slug": "us-east"}}
                ]
            }));
        })
        .await;

    let branches = client(&server).list_branches("acme", "mydb").await.unwrap();

    assert_eq!(branches.len(), 2);
    assert!(branches[0].production);
    assert_eq!(branches[1].parent_branch, "main");
}

#[tokio::test]
async fn create_database_omits_unset_fields() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/organizations/acme/databases")
                .json_body(json!({"name": "mydb"}));
            then.status(201).json_body(json!({
                "name": "mydb",
                "state": "pending",
                "region": {"slug": "us-east"}
            }));
        })
        .await;

    let database = client(&server)
        .create_database(&CreateDatabaseRequest {
            organization: "acme".to_string(),
            name: "mydb".to_string(),
            notes: None,
            region: None,
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(database.state, "pending");
}

#[tokio::test]
async fn create_password_decodes_renamed_fields() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/organizations/acme/databases/mydb/branches/main/passwords")
                .json_body(json!({"name": "ci", "role": "reader"}));
            then.status(201).json_body(json!({
                "id": "pw123",
                "name": "ci",
                "role": "reader",
                "username": "abc",
                "access_host_url": "aws.connect.psdb.cloud",
                "plain_text": "pscale_pw_secret"
            }));
        })
        .await;

    let password = client(&server)
        .create_password(&CreatePasswordRequest {
            organization: "acme".to_string(),
            database: "mydb".to_string(),
            branch: "main".to_string(),
            name: "ci".to_string(),
            role: Some("reader".to_string()),
        })
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(password.public_id, "pw123");
    assert_eq!(password.hostname, "aws.connect.psdb.cloud");
    assert_eq!(password.plaintext, "pscale_pw_secret");
}

#[tokio::test]
async fn close_deploy_request_patches_state() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/v1/organizations/acme/databases/mydb/deploy-requests/7")
                .json_body(json!({"state": "closed"}));
            then.status(200).json_body(json!({
                "id": "dr7",
                "number": 7,
                "branch": "dev",
                "into_branch": "main",
                "state": "closed"
            }));
        })
        .await;

    let request = client(&server)
        .close_deploy_request("acme", "mydb", 7)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(request.number, 7);
    assert_eq!(request.state, "closed");
}

#[tokio::test]
async fn delete_accepts_empty_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1/organizations/acme/databases/mydb/branches/dev");
            then.status(204);
        })
        .await;

    client(&server)
        .delete_branch("acme", "mydb", "dev")
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn error_body_is_decoded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organizations/acme/databases/missing");
            then.status(404).json_body(json!({
                "code": "not_found",
                "message": "Not Found"
            }));
        })
        .await;

    let err = client(&server)
        .get_database("acme", "missing")
        .await
        .unwrap_err();

    match &err {
        ApiError::Status {
            status,
            code,
            message,
        } => {
            assert_eq!(*status, 404);
            assert_eq!(code.as_deref(), Some("not_found"));
            assert_eq!(message, "Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_not_found());

    let err = err.context("Unable to read database acme/missing");
    assert!(matches!(err, ProviderError::NotFound(_)));
    assert!(err.message().starts_with("Unable to read database acme/missing"));
}

#[tokio::test]
async fn non_json_error_uses_status_reason() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/organizations/acme/regions");
            then.status(502).body("<html>bad gateway</html>");
        })
        .await;

    let err = client(&server).list_regions("acme").await.unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert!(err.to_string().contains("Bad Gateway"));
    assert!(matches!(err.context("Unable to list regions"), ProviderError::Unavailable(_)));
}

#[tokio::test]
async fn base_url_path_is_preserved() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/proxy/v1/organizations/acme/regions");
            then.status(200).json_body(json!({"data": []}));
        })
        .await;

    let regions = client_at(&server.url("/proxy/"))
        .list_regions("acme")
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(regions.is_empty());
}

#[tokio::test]
async fn configured_provider_reads_regions_over_http() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/organizations/acme/regions")
                .header("authorization", "env-id:config-secret");
            then.status(200).json_body(json!({
                "data": [{
                    "slug": "us-east",
                    "display_name": "AWS us-east-1",
                    "location": "Ashburn, Virginia",
                    "enabled": true
                }]
            }));
        })
        .await;

    let env: HashMap<String, String> = [
        ("PLANETSCALE_SERVICE_TOKEN_ID".to_string(), "env-id".to_string()),
        ("PLANETSCALE_API_URL".to_string(), server.url("/")),
    ]
    .into_iter()
    .collect();
    let provider = PlanetScaleProvider::new().with_env(env);

    let diagnostics = provider
        .configure(json!({"service_token": "config-secret"}))
        .await
        .unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let state = provider
        .read_data_source("planetscale_regions", json!({"organization": "acme"}))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(state["regions"][0]["slug"], "us-east");
    assert_eq!(state["regions"][0]["name"], "AWS us-east-1");
}
