//! Test support: an in-memory PlanetScale API and a provider harness.
//!
//! [`FakeApi`] implements [`PlanetScaleApi`] over in-memory maps and records
//! every call, so resource behavior can be asserted without a network.
//! [`ProviderTester`] drives a [`ProviderService`] without a gRPC server.
//!
//! ```ignore
//! use planetscale_provider::testing::{FakeApi, ProviderTester};
//! use serde_json::json;
//!
//! let fake = FakeApi::new();
//! let tester = ProviderTester::with_fake(&fake);
//! tester.configure(json!({"service_token_id": "id", "service_token": "secret"})).await?;
//! let state = tester
//!     .lifecycle_create("planetscale_database", json!({"organization": "acme", "name": "mydb"}))
//!     .await?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::client::{ApiError, ClientFactory, PlanetScaleApi, SharedClient};
use crate::config::ResolvedConfig;
use crate::error::ProviderError;
use crate::models::{
    Backup, CreateDatabaseBranchRequest, CreateDatabaseRequest, CreateDeployRequestRequest,
    CreatePasswordRequest, Database, DatabaseBranch, DatabaseBranchPassword, DeployRequest, Region,
};
use crate::provider::PlanetScaleProvider;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};

type DatabaseKey = (String, String);
type BranchKey = (String, String, String);

fn database_key(organization: &str, database: &str) -> DatabaseKey {
    (organization.to_string(), database.to_string())
}

fn branch_key(organization: &str, database: &str, branch: &str) -> BranchKey {
    (
        organization.to_string(),
        database.to_string(),
        branch.to_string(),
    )
}

fn not_found(what: String) -> ApiError {
    ApiError::Status {
        status: 404,
        code: Some("not_found".to_string()),
        message: format!("{what} not found"),
    }
}

fn conflict(what: String) -> ApiError {
    ApiError::Status {
        status: 409,
        code: Some("conflict".to_string()),
        message: format!("{what} already exists"),
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    resolved: Vec<ResolvedConfig>,
    failure: Option<(u16, String)>,
    next_id: u64,
    regions: Vec<Region>,
    databases: BTreeMap<DatabaseKey, Database>,
    branches: BTreeMap<BranchKey, DatabaseBranch>,
    passwords: BTreeMap<BranchKey, Vec<DatabaseBranchPassword>>,
    backups: BTreeMap<BranchKey, Vec<Backup>>,
    deploy_requests: BTreeMap<DatabaseKey, Vec<DeployRequest>>,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn branch(&self, key: &BranchKey) -> Result<&DatabaseBranch, ApiError> {
        self.branches
            .get(key)
            .ok_or_else(|| not_found(format!("branch {}/{}/{}", key.0, key.1, key.2)))
    }
}

/// An in-memory [`PlanetScaleApi`].
///
/// Clones share state, so a test can keep one handle while the provider
/// owns another.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    /// Region assigned when a create request does not name one.
    pub const DEFAULT_REGION: &'static str = "us-east";

    pub fn new() -> Self {
        let fake = Self::default();
        fake.lock().regions = vec![Region {
            slug: Self::DEFAULT_REGION.to_string(),
            name: "AWS us-east-1".to_string(),
            location: "Ashburn, Virginia".to_string(),
            enabled: true,
        }];
        fake
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and fail it if a failure was injected.
    fn record(&self, call: String) -> Result<MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some((status, message)) = state.failure.clone() {
            return Err(ApiError::Status {
                status,
                code: None,
                message,
            });
        }
        Ok(state)
    }

    /// A factory that records the resolved configuration and hands out this fake.
    pub fn factory(&self) -> ClientFactory {
        let fake = self.clone();
        Arc::new(move |config: &ResolvedConfig| -> Result<SharedClient, ApiError> {
            fake.lock().resolved.push(config.clone());
            Ok(Arc::new(fake.clone()))
        })
    }

    /// A factory that always fails to build a client.
    pub fn failing_factory() -> ClientFactory {
        Arc::new(|_: &ResolvedConfig| -> Result<SharedClient, ApiError> {
            Err(ApiError::InvalidCredentials(
                "header value contains invalid characters".to_string(),
            ))
        })
    }

    /// Every call made so far, e.g. `get_branch acme/mydb/main`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Whether a call whose name is `method` was made.
    pub fn was_called(&self, method: &str) -> bool {
        self.lock()
            .calls
            .iter()
            .any(|c| c.split(' ').next() == Some(method))
    }

    /// Configurations the factory was invoked with.
    pub fn resolved_configs(&self) -> Vec<ResolvedConfig> {
        self.lock().resolved.clone()
    }

    /// Make every following call fail with the given HTTP status.
    pub fn fail_with(&self, status: u16, message: impl Into<String>) {
        self.lock().failure = Some((status, message.into()));
    }

    pub fn insert_database(&self, organization: &str, database: Database) {
        self.lock()
            .databases
            .insert(database_key(organization, &database.name), database);
    }

    pub fn insert_branch(&self, organization: &str, database: &str, branch: DatabaseBranch) {
        self.lock()
            .branches
            .insert(branch_key(organization, database, &branch.name), branch);
    }

    pub fn insert_password(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        password: DatabaseBranchPassword,
    ) {
        self.lock()
            .passwords
            .entry(branch_key(organization, database, branch))
            .or_default()
            .push(password);
    }

    pub fn insert_backup(&self, organization: &str, database: &str, branch: &str, backup: Backup) {
        self.lock()
            .backups
            .entry(branch_key(organization, database, branch))
            .or_default()
            .push(backup);
    }

    pub fn insert_deploy_request(&self, organization: &str, database: &str, request: DeployRequest) {
        self.lock()
            .deploy_requests
            .entry(database_key(organization, database))
            .or_default()
            .push(request);
    }

    pub fn database(&self, organization: &str, database: &str) -> Option<Database> {
        self.lock()
            .databases
            .get(&database_key(organization, database))
            .cloned()
    }

    pub fn deploy_request(&self, organization: &str, database: &str, number: u64) -> Option<DeployRequest> {
        self.lock()
            .deploy_requests
            .get(&database_key(organization, database))
            .and_then(|requests| requests.iter().find(|r| r.number == number).cloned())
    }
}

#[async_trait]
impl PlanetScaleApi for FakeApi {
    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<Database, ApiError> {
        let mut state = self.record(format!(
            "create_database {}/{}",
            request.organization, request.name
        ))?;
        let key = database_key(&request.organization, &request.name);
        if state.databases.contains_key(&key) {
            return Err(conflict(format!("database {}", request.name)));
        }

        let slug = request
            .region
            .clone()
            .unwrap_or_else(|| Self::DEFAULT_REGION.to_string());
        let region = state
            .regions
            .iter()
            .find(|r| r.slug == slug)
            .cloned()
            .unwrap_or(Region {
                slug,
                ..Default::default()
            });
        let database = Database {
            name: request.name.clone(),
            notes: request.notes.clone().unwrap_or_default(),
            region: region.clone(),
            html_url: format!(
                "https://app.planetscale.com/{}/{}",
                request.organization, request.name
            ),
            state: "ready".to_string(),
        };
        state.databases.insert(key, database.clone());

        // Every new database starts with a production `main` branch.
        state.branches.insert(
            branch_key(&request.organization, &request.name, "main"),
            DatabaseBranch {
                name: "main".to_string(),
                region,
                production: true,
                ready: true,
                ..Default::default()
            },
        );
        Ok(database)
    }

    async fn get_database(&self, organization: &str, database: &str) -> Result<Database, ApiError> {
        let state = self.record(format!("get_database {organization}/{database}"))?;
        state
            .databases
            .get(&database_key(organization, database))
            .cloned()
            .ok_or_else(|| not_found(format!("database {database}")))
    }

    async fn list_databases(&self, organization: &str) -> Result<Vec<Database>, ApiError> {
        let state = self.record(format!("list_databases {organization}"))?;
        Ok(state
            .databases
            .iter()
            .filter(|((org, _), _)| org == organization)
            .map(|(_, db)| db.clone())
            .collect())
    }

    async fn delete_database(&self, organization: &str, database: &str) -> Result<(), ApiError> {
        let mut state = self.record(format!("delete_database {organization}/{database}"))?;
        state
            .databases
            .remove(&database_key(organization, database))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("database {database}")))
    }

    async fn create_branch(
        &self,
        request: &CreateDatabaseBranchRequest,
    ) -> Result<DatabaseBranch, ApiError> {
        let mut state = self.record(format!(
            "create_branch {}/{}/{}",
            request.organization, request.database, request.name
        ))?;
        let database = state
            .databases
            .get(&database_key(&request.organization, &request.database))
            .cloned()
            .ok_or_else(|| not_found(format!("database {}", request.database)))?;
        let key = branch_key(&request.organization, &request.database, &request.name);
        if state.branches.contains_key(&key) {
            return Err(conflict(format!("branch {}", request.name)));
        }

        let region = match &request.region {
            Some(slug) => Region {
                slug: slug.clone(),
                ..Default::default()
            },
            None => database.region,
        };
        let branch = DatabaseBranch {
            name: request.name.clone(),
            parent_branch: request
                .parent_branch
                .clone()
                .unwrap_or_else(|| "main".to_string()),
            region,
            production: false,
            ready: true,
            html_url: format!("{}/{}", database.html_url, request.name),
            access_host_url: "aws.connect.psdb.cloud".to_string(),
        };
        state.branches.insert(key, branch.clone());
        Ok(branch)
    }

    async fn get_branch(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<DatabaseBranch, ApiError> {
        let state = self.record(format!("get_branch {organization}/{database}/{branch}"))?;
        state
            .branch(&branch_key(organization, database, branch))
            .cloned()
    }

    async fn list_branches(
        &self,
        organization: &str,
        database: &str,
    ) -> Result<Vec<DatabaseBranch>, ApiError> {
        let state = self.record(format!("list_branches {organization}/{database}"))?;
        Ok(state
            .branches
            .iter()
            .filter(|((org, db, _), _)| org == organization && db == database)
            .map(|(_, branch)| branch.clone())
            .collect())
    }

    async fn delete_branch(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.record(format!("delete_branch {organization}/{database}/{branch}"))?;
        state
            .branches
            .remove(&branch_key(organization, database, branch))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("branch {branch}")))
    }

    async fn create_password(
        &self,
        request: &CreatePasswordRequest,
    ) -> Result<DatabaseBranchPassword, ApiError> {
        let mut state = self.record(format!(
            "create_password {}/{}/{}",
            request.organization, request.database, request.branch
        ))?;
        let key = branch_key(&request.organization, &request.database, &request.branch);
        let hostname = state.branch(&key)?.access_host_url.clone();
        let id = state.next_id();
        let password = DatabaseBranchPassword {
            public_id: format!("pw{id}"),
            name: request.name.clone(),
            username: format!("user{id}"),
            hostname,
            role: request.role.clone().unwrap_or_else(|| "admin".to_string()),
            plaintext: format!("pscale_pw_{id}"),
        };
        state.passwords.entry(key).or_default().push(DatabaseBranchPassword {
            plaintext: String::new(),
            ..password.clone()
        });
        Ok(password)
    }

    async fn get_password(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        password_id: &str,
    ) -> Result<DatabaseBranchPassword, ApiError> {
        let state = self.record(format!(
            "get_password {organization}/{database}/{branch}/{password_id}"
        ))?;
        state
            .passwords
            .get(&branch_key(organization, database, branch))
            .and_then(|passwords| passwords.iter().find(|p| p.public_id == password_id))
            .cloned()
            .ok_or_else(|| not_found(format!("password {password_id}")))
    }

    async fn list_passwords(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Vec<DatabaseBranchPassword>, ApiError> {
        let state = self.record(format!("list_passwords {organization}/{database}/{branch}"))?;
        Ok(state
            .passwords
            .get(&branch_key(organization, database, branch))
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_password(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        password_id: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.record(format!(
            "delete_password {organization}/{database}/{branch}/{password_id}"
        ))?;
        let passwords = state
            .passwords
            .get_mut(&branch_key(organization, database, branch))
            .ok_or_else(|| not_found(format!("password {password_id}")))?;
        let before = passwords.len();
        passwords.retain(|p| p.public_id != password_id);
        if passwords.len() == before {
            return Err(not_found(format!("password {password_id}")));
        }
        Ok(())
    }

    async fn create_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Backup, ApiError> {
        let mut state = self.record(format!("create_backup {organization}/{database}/{branch}"))?;
        let key = branch_key(organization, database, branch);
        state.branch(&key)?;
        let id = state.next_id();
        let backup = Backup {
            public_id: format!("bk{id}"),
            name: format!("{branch}-backup-{id}"),
            state: "pending".to_string(),
            created_at: Some("2024-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        };
        state.backups.entry(key).or_default().push(backup.clone());
        Ok(backup)
    }

    async fn get_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        backup_id: &str,
    ) -> Result<Backup, ApiError> {
        let state = self.record(format!(
            "get_backup {organization}/{database}/{branch}/{backup_id}"
        ))?;
        state
            .backups
            .get(&branch_key(organization, database, branch))
            .and_then(|backups| backups.iter().find(|b| b.public_id == backup_id))
            .cloned()
            .ok_or_else(|| not_found(format!("backup {backup_id}")))
    }

    async fn list_backups(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Vec<Backup>, ApiError> {
        let state = self.record(format!("list_backups {organization}/{database}/{branch}"))?;
        Ok(state
            .backups
            .get(&branch_key(organization, database, branch))
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        backup_id: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.record(format!(
            "delete_backup {organization}/{database}/{branch}/{backup_id}"
        ))?;
        let backups = state
            .backups
            .get_mut(&branch_key(organization, database, branch))
            .ok_or_else(|| not_found(format!("backup {backup_id}")))?;
        let before = backups.len();
        backups.retain(|b| b.public_id != backup_id);
        if backups.len() == before {
            return Err(not_found(format!("backup {backup_id}")));
        }
        Ok(())
    }

    async fn create_deploy_request(
        &self,
        request: &CreateDeployRequestRequest,
    ) -> Result<DeployRequest, ApiError> {
        let mut state = self.record(format!(
            "create_deploy_request {}/{}/{}",
            request.organization, request.database, request.branch
        ))?;
        state.branch(&branch_key(
            &request.organization,
            &request.database,
            &request.branch,
        ))?;
        let id = state.next_id();
        let requests = state
            .deploy_requests
            .entry(database_key(&request.organization, &request.database))
            .or_default();
        let deploy_request = DeployRequest {
            id: format!("dr{id}"),
            number: requests.len() as u64 + 1,
            branch: request.branch.clone(),
            into_branch: request.into_branch.clone(),
            notes: request.notes.clone().unwrap_or_default(),
            state: "open".to_string(),
            deployment_state: "pending".to_string(),
            approved: false,
            html_url: format!(
                "https://app.planetscale.com/{}/{}/deploy-requests/{}",
                request.organization,
                request.database,
                requests.len() + 1
            ),
            created_at: Some("2024-01-01T00:00:00.000Z".to_string()),
            updated_at: Some("2024-01-01T00:00:00.000Z".to_string()),
        };
        requests.push(deploy_request.clone());
        Ok(deploy_request)
    }

    async fn get_deploy_request(
        &self,
        organization: &str,
        database: &str,
        number: u64,
    ) -> Result<DeployRequest, ApiError> {
        let state = self.record(format!("get_deploy_request {organization}/{database}/{number}"))?;
        state
            .deploy_requests
            .get(&database_key(organization, database))
            .and_then(|requests| requests.iter().find(|r| r.number == number))
            .cloned()
            .ok_or_else(|| not_found(format!("deploy request #{number}")))
    }

    async fn close_deploy_request(
        &self,
        organization: &str,
        database: &str,
        number: u64,
    ) -> Result<DeployRequest, ApiError> {
        let mut state = self.record(format!(
            "close_deploy_request {organization}/{database}/{number}"
        ))?;
        let request = state
            .deploy_requests
            .get_mut(&database_key(organization, database))
            .and_then(|requests| requests.iter_mut().find(|r| r.number == number))
            .ok_or_else(|| not_found(format!("deploy request #{number}")))?;
        request.state = "closed".to_string();
        Ok(request.clone())
    }

    async fn list_regions(&self, organization: &str) -> Result<Vec<Region>, ApiError> {
        let state = self.record(format!("list_regions {organization}"))?;
        Ok(state.regions.clone())
    }
}

/// Error from a [`ProviderTester`] operation that reports diagnostics.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("operation failed with diagnostics: {}", summaries(.0))]
    Diagnostics(Vec<Diagnostic>),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

fn summaries(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.attribute {
            Some(attribute) => format!("{} (at {attribute})", d.summary),
            None => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Keep only error diagnostics; `Ok` when there are none.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(Diagnostic::is_error)
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Drives a [`ProviderService`] directly, without a gRPC server.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl ProviderTester<PlanetScaleProvider> {
    /// A PlanetScale provider wired to `fake`, with an empty environment.
    pub fn with_fake(fake: &FakeApi) -> Self {
        Self::new(
            PlanetScaleProvider::new()
                .with_env(HashMap::<String, String>::new())
                .with_client_factory(fake.factory()),
        )
    }
}

impl<P: ProviderService> ProviderTester<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.validate_provider_config(config).await?)
    }

    /// Configure the provider; error diagnostics become [`TestError::Diagnostics`].
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.configure(config).await?)
    }

    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_resource_config(resource_type, config)
                .await?,
        )
    }

    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        check_diagnostics(
            self.provider
                .validate_data_source_config(data_source_type, config)
                .await?,
        )
    }

    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    /// Plan, create, then read back. Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan the destroy, then delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone()).await?;
        self.delete(resource_type, current_state).await
    }
}

/// Panics unless the plan creates the resource.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty() && !plan.requires_replace,
        "expected a create plan, got {} change(s), requires_replace = {}",
        plan.changes.len(),
        plan.requires_replace
    );
}

/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "expected no changes, got {:?}",
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Panics unless the plan replaces the resource.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(plan.requires_replace, "expected the plan to require replacement");
}

/// Panics unless the plan changes `path`.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "expected a change to '{path}', changed: {:?}",
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Panics unless an error diagnostic is attributed to `attribute`.
pub fn assert_attribute_error(diagnostics: &[Diagnostic], attribute: &str) {
    assert!(
        diagnostics.iter().any(|d| {
            d.severity == DiagnosticSeverity::Error && d.attribute.as_deref() == Some(attribute)
        }),
        "expected an error on '{attribute}', got: {}",
        summaries(diagnostics)
    );
}

/// Panics unless an error diagnostic summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error && d.summary.contains(substring)),
        "expected an error containing '{substring}', got: {}",
        summaries(diagnostics)
    );
}
