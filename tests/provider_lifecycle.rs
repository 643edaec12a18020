use std::collections::HashMap;

use planetscale_provider::models::{
    Backup, Database, DatabaseBranch, DatabaseBranchPassword, DeployRequest, Region,
};
use planetscale_provider::testing::{
    assert_attribute_error, assert_error_contains, assert_plan_changes_attribute,
    assert_plan_replaces, FakeApi, ProviderTester, TestError,
};
use planetscale_provider::{PlanetScaleProvider, ProviderError, ProviderService};
use serde_json::{json, Value};

const DATABASE: &str = "planetscale_database";
const BRANCH: &str = "planetscale_database_branch";
const PASSWORD: &str = "planetscale_database_branch_password";
const BACKUP: &str = "planetscale_backup";
const DEPLOY_REQUEST: &str = "planetscale_deploy_request";

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn configured(fake: &FakeApi) -> ProviderTester<PlanetScaleProvider> {
    let tester = ProviderTester::with_fake(fake);
    tester
        .configure(json!({"service_token_id": "id", "service_token": "secret"}))
        .await
        .unwrap();
    tester
}

fn seed_database(fake: &FakeApi) {
    fake.insert_database(
        "myorg",
        Database {
            name: "mydb".to_string(),
            region: Region {
                slug: "eu-west".to_string(),
                ..Default::default()
            },
            state: "ready".to_string(),
            ..Default::default()
        },
    );
    fake.insert_branch(
        "myorg",
        "mydb",
        DatabaseBranch {
            name: "main".to_string(),
            production: true,
            ready: true,
            ..Default::default()
        },
    );
    fake.insert_branch(
        "myorg",
        "mydb",
        DatabaseBranch {
            name: "mybranch".to_string(),
            parent_branch: "main".to_string(),
            region: Region {
                slug: "eu-west".to_string(),
                ..Default::default()
            },
            ready: true,
            ..Default::default()
        },
    );
}

#[tokio::test]
async fn configure_merges_config_and_environment() {
    let fake = FakeApi::new();
    let provider = PlanetScaleProvider::new()
        .with_env(env(&[("PLANETSCALE_SERVICE_TOKEN", "secret")]))
        .with_client_factory(fake.factory());

    let diagnostics = provider
        .configure(json!({"service_token_id": "abc"}))
        .await
        .unwrap();

    assert!(diagnostics.is_empty());
    let resolved = fake.resolved_configs();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].credentials.token_id, "abc");
    assert_eq!(resolved[0].credentials.token, "secret");
    assert_eq!(resolved[0].api_url.as_str(), "https://api.planetscale.com/");
}

#[tokio::test]
async fn configure_without_token_id_leaves_adapters_unconfigured() {
    let fake = FakeApi::new();
    let tester = ProviderTester::new(
        PlanetScaleProvider::new()
            .with_env(env(&[("PLANETSCALE_SERVICE_TOKEN", "secret")]))
            .with_client_factory(fake.factory()),
    );

    match tester.configure(json!({})).await {
        Err(TestError::Diagnostics(diagnostics)) => {
            assert_eq!(diagnostics.len(), 1);
            assert_attribute_error(&diagnostics, "service_token_id");
        }
        other => panic!("expected diagnostics, got {other:?}"),
    }
    assert!(fake.resolved_configs().is_empty());

    let err = tester
        .read(DATABASE, json!({"organization": "myorg", "name": "mydb"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(_)));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn unknown_token_is_reported() {
    let tester = ProviderTester::with_fake(&FakeApi::new());
    match tester
        .configure(json!({"service_token_id": "id", "service_token": {"$unknown": true}}))
        .await
    {
        Err(TestError::Diagnostics(diagnostics)) => {
            assert_eq!(diagnostics.len(), 1);
            assert_attribute_error(&diagnostics, "service_token");
            assert_eq!(diagnostics[0].summary, "Unknown ServiceToken");
        }
        other => panic!("expected diagnostics, got {other:?}"),
    }
}

#[tokio::test]
async fn deploy_request_delete_closes_it() {
    let fake = FakeApi::new();
    seed_database(&fake);
    let tester = configured(&fake).await;

    let state = tester
        .create(
            DEPLOY_REQUEST,
            json!({
                "organization": "myorg",
                "database": "mydb",
                "branch": "mybranch",
                "into_branch": "main",
                "notes": "add index"
            }),
        )
        .await
        .unwrap();
    assert_eq!(state["number"], 1);
    assert_eq!(state["state"], "open");

    tester.delete(DEPLOY_REQUEST, state).await.unwrap();

    assert!(fake.was_called("close_deploy_request"));
    assert!(fake
        .calls()
        .iter()
        .all(|call| !call.starts_with("delete_")));
    assert_eq!(fake.deploy_request("myorg", "mydb", 1).unwrap().state, "closed");
}

#[tokio::test]
async fn deploy_request_delete_reports_close_failure() {
    let fake = FakeApi::new();
    let tester = configured(&fake).await;

    let err = tester
        .delete(
            DEPLOY_REQUEST,
            json!({
                "organization": "myorg",
                "database": "mydb",
                "branch": "mybranch",
                "into_branch": "main",
                "number": 9
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::NotFound(_)));
    assert_eq!(fake.calls(), vec!["close_deploy_request myorg/mydb/9"]);
}

#[tokio::test]
async fn branch_import_reads_the_named_branch() {
    let fake = FakeApi::new();
    seed_database(&fake);
    let tester = configured(&fake).await;

    let imported = tester
        .import_resource(BRANCH, "myorg/mydb/mybranch")
        .await
        .unwrap();

    assert_eq!(fake.calls(), vec!["get_branch myorg/mydb/mybranch"]);
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].resource_type, BRANCH);
    let state = &imported[0].state;
    assert_eq!(state["organization"], "myorg");
    assert_eq!(state["database"], "mydb");
    assert_eq!(state["name"], "mybranch");
    assert_eq!(state["parent_branch"], "main");
    assert_eq!(state["region"], "eu-west");
}

#[tokio::test]
async fn malformed_import_id_fails_before_any_call() {
    let fake = FakeApi::new();
    let tester = configured(&fake).await;

    for (resource_type, id) in [(BRANCH, "myorg/mydb"), (DATABASE, "myorg/mydb/extra"), (DATABASE, "myorg")] {
        let err = tester.import_resource(resource_type, id).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)), "{id}: {err}");
    }
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn imported_database_plans_no_changes() {
    let fake = FakeApi::new();
    seed_database(&fake);
    let tester = configured(&fake).await;

    let imported = tester.import_resource(DATABASE, "myorg/mydb").await.unwrap();
    let state = imported[0].state.clone();
    assert_eq!(state["region"], "eu-west");

    let plan = tester
        .plan_update(
            DATABASE,
            state,
            json!({"organization": "myorg", "name": "mydb", "notes": null, "region": null}),
        )
        .await
        .unwrap();
    assert!(plan.changes.is_empty(), "{:?}", plan.changes);
}

#[tokio::test]
async fn renaming_a_branch_replaces_it() {
    let fake = FakeApi::new();
    seed_database(&fake);
    let tester = configured(&fake).await;

    let state = tester
        .read(
            BRANCH,
            json!({"organization": "myorg", "database": "mydb", "name": "mybranch"}),
        )
        .await
        .unwrap();

    let proposed = json!({"organization": "myorg", "database": "mydb", "name": "renamed"});
    let plan = tester.plan_update(BRANCH, state, proposed).await.unwrap();

    assert_plan_replaces(&plan);
    assert_plan_changes_attribute(&plan, "name");
    assert_eq!(plan.planned_state["ready"], Value::Null);
}

#[tokio::test]
async fn password_plaintext_survives_refresh() {
    let fake = FakeApi::new();
    seed_database(&fake);
    let tester = configured(&fake).await;

    let created = tester
        .create(
            PASSWORD,
            json!({
                "organization": "myorg",
                "database": "mydb",
                "branch": "main",
                "name": "ci",
                "role": "reader"
            }),
        )
        .await
        .unwrap();
    let plaintext = created["plaintext"].as_str().unwrap().to_string();
    assert!(!plaintext.is_empty());
    assert_eq!(created["role"], "reader");

    let refreshed = tester.read(PASSWORD, created.clone()).await.unwrap();
    assert_eq!(refreshed["plaintext"], plaintext.as_str());
    assert_eq!(refreshed["public_id"], created["public_id"]);

    tester.delete(PASSWORD, refreshed).await.unwrap();
    assert!(fake.was_called("delete_password"));
}

#[tokio::test]
async fn backup_lifecycle_uses_public_id() {
    let fake = FakeApi::new();
    seed_database(&fake);
    let tester = configured(&fake).await;

    let created = tester
        .create(
            BACKUP,
            json!({"organization": "myorg", "database": "mydb", "branch": "main"}),
        )
        .await
        .unwrap();
    let public_id = created["public_id"].as_str().unwrap().to_string();

    let read = tester.read(BACKUP, created).await.unwrap();
    assert_eq!(read["public_id"], public_id.as_str());
    assert!(fake
        .calls()
        .contains(&format!("get_backup myorg/mydb/main/{public_id}")));

    tester.delete(BACKUP, read).await.unwrap();
    assert!(fake
        .calls()
        .contains(&format!("delete_backup myorg/mydb/main/{public_id}")));
}

#[tokio::test]
async fn api_errors_map_to_provider_errors() {
    let fake = FakeApi::new();
    let tester = configured(&fake).await;
    fake.fail_with(403, "token lacks read_database");

    let err = tester
        .read(DATABASE, json!({"organization": "myorg", "name": "mydb"}))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::PermissionDenied(_)));
    assert!(err.message().contains("myorg/mydb"));
    assert!(err.message().contains("token lacks read_database"));
}

#[tokio::test]
async fn data_sources_list_entities() {
    let fake = FakeApi::new();
    seed_database(&fake);
    let tester = configured(&fake).await;

    let databases = tester
        .read_data_source("planetscale_databases", json!({"organization": "myorg"}))
        .await
        .unwrap();
    assert_eq!(databases["databases"][0]["name"], "mydb");

    let branches = tester
        .read_data_source(
            "planetscale_database_branches",
            json!({"organization": "myorg", "database": "mydb"}),
        )
        .await
        .unwrap();
    assert_eq!(branches["database_branches"].as_array().unwrap().len(), 2);

    let regions = tester
        .read_data_source("planetscale_regions", json!({"organization": "myorg"}))
        .await
        .unwrap();
    assert_eq!(regions["regions"][0]["slug"], FakeApi::DEFAULT_REGION);
    assert!(fake.calls().contains(&"list_regions myorg".to_string()));
}

#[tokio::test]
async fn deploy_request_data_source_uses_configured_number() {
    let fake = FakeApi::new();
    seed_database(&fake);
    for number in 1..=2 {
        fake.insert_deploy_request(
            "myorg",
            "mydb",
            DeployRequest {
                number,
                branch: "mybranch".to_string(),
                into_branch: "main".to_string(),
                state: "open".to_string(),
                ..Default::default()
            },
        );
    }
    let tester = configured(&fake).await;

    let state = tester
        .read_data_source(
            "planetscale_deploy_requests",
            json!({"organization": "myorg", "database": "mydb", "number": 2}),
        )
        .await
        .unwrap();

    assert_eq!(state["deploy_request"]["number"], 2);
    assert!(fake
        .calls()
        .contains(&"get_deploy_request myorg/mydb/2".to_string()));
}

#[tokio::test]
async fn branch_data_sources_list_passwords_and_backups() {
    let fake = FakeApi::new();
    seed_database(&fake);
    fake.insert_password(
        "myorg",
        "mydb",
        "main",
        DatabaseBranchPassword {
            public_id: "pw1".to_string(),
            name: "app".to_string(),
            role: "admin".to_string(),
            ..Default::default()
        },
    );
    fake.insert_backup(
        "myorg",
        "mydb",
        "main",
        Backup {
            public_id: "bk1".to_string(),
            name: "nightly".to_string(),
            state: "success".to_string(),
            size: 1024,
            ..Default::default()
        },
    );
    let tester = configured(&fake).await;
    let branch = json!({"organization": "myorg", "database": "mydb", "branch": "main"});

    let passwords = tester
        .read_data_source("planetscale_database_branch_passwords", branch.clone())
        .await
        .unwrap();
    assert_eq!(passwords["passwords"].as_array().unwrap().len(), 1);
    assert_eq!(passwords["passwords"][0]["public_id"], "pw1");
    assert_eq!(passwords["passwords"][0]["role"], "admin");

    let backups = tester
        .read_data_source("planetscale_backups", branch)
        .await
        .unwrap();
    assert_eq!(backups["backups"][0]["public_id"], "bk1");
    assert_eq!(backups["backups"][0]["size"], 1024);
}

#[tokio::test]
async fn data_source_config_is_validated() {
    let tester = ProviderTester::with_fake(&FakeApi::new());

    assert!(tester
        .data_source_types()
        .contains(&"planetscale_backups".to_string()));
    assert!(tester.resource_types().contains(&BACKUP.to_string()));

    match tester
        .validate_data_source_config("planetscale_backups", json!({"organization": "myorg"}))
        .await
    {
        Err(TestError::Diagnostics(diagnostics)) => {
            assert_eq!(diagnostics.len(), 2);
            assert_attribute_error(&diagnostics, "branch");
            assert_error_contains(&diagnostics, "Missing required attribute 'database'");
        }
        other => panic!("expected diagnostics, got {other:?}"),
    }
}
