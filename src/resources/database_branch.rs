use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{decode_state, encode_state, non_empty, require_client, Resource, BRANCH_REGIONS};
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::import_id::BranchImportId;
use crate::models::{CreateDatabaseBranchRequest, DatabaseBranch};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// State of `planetscale_database_branch`.
///
/// `backup_id` and `seed_data` are create-only inputs; the API never echoes
/// them back, so imported branches leave them null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseBranchState {
    pub organization: String,
    pub database: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub parent_branch: Option<String>,
    #[serde(default)]
    pub backup_id: Option<String>,
    #[serde(default)]
    pub seed_data: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub production: Option<bool>,
    #[serde(default)]
    pub ready: Option<bool>,
}

impl DatabaseBranchState {
    fn apply(&mut self, branch: &DatabaseBranch) {
        if self.region.is_none() && !branch.region.slug.is_empty() {
            self.region = Some(branch.region.slug.clone());
        }
        if self.parent_branch.is_none() && !branch.parent_branch.is_empty() {
            self.parent_branch = Some(branch.parent_branch.clone());
        }
        self.html_url = Some(branch.html_url.clone());
        self.production = Some(branch.production);
        self.ready = Some(branch.ready);
    }
}

/// A branch of a PlanetScale database.
pub struct DatabaseBranchResource {
    client: Option<SharedClient>,
}

impl DatabaseBranchResource {
    pub const TYPE_NAME: &'static str = "planetscale_database_branch";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for DatabaseBranchResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "A database branch: an isolated copy of a database's schema used for \
                 development and testing.",
            )
            .with_attribute(
                "organization",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The organization the database belongs to."),
            )
            .with_attribute(
                "database",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The database to create the branch in."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Name of the branch."),
            )
            .with_attribute(
                "region",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_force_new()
                    .with_one_of(BRANCH_REGIONS.iter().copied())
                    .with_description(
                        "Region of the branch. Defaults to the organization's default region.",
                    ),
            )
            .with_attribute(
                "parent_branch",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_force_new()
                    .with_description(
                        "Branch to fork from. Defaults to the database's default branch.",
                    ),
            )
            .with_attribute(
                "backup_id",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("Backup to restore into the new branch."),
            )
            .with_attribute(
                "seed_data",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("Branch whose data seeds the new branch."),
            )
            .with_attribute(
                "html_url",
                Attribute::computed_string().with_description("URL of the branch in the web UI."),
            )
            .with_attribute(
                "production",
                Attribute::computed_bool().with_description("Whether this is a production branch."),
            )
            .with_attribute(
                "ready",
                Attribute::computed_bool().with_description("Whether the branch is ready for use."),
            )
    }

    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: DatabaseBranchState = decode_state(planned_state)?;

        let branch = client
            .create_branch(&CreateDatabaseBranchRequest {
                organization: state.organization.clone(),
                database: state.database.clone(),
                name: state.name.clone(),
                region: non_empty(&state.region),
                parent_branch: non_empty(&state.parent_branch),
                backup_id: non_empty(&state.backup_id),
                seed_data: non_empty(&state.seed_data),
            })
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to create branch {}/{}/{}",
                    state.organization, state.database, state.name
                ))
            })?;

        info!(
            organization = %state.organization,
            database = %state.database,
            branch = %state.name,
            "created database branch"
        );
        state.apply(&branch);
        encode_state(&state)
    }

    async fn read(&self, current_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: DatabaseBranchState = decode_state(current_state)?;

        let branch = client
            .get_branch(&state.organization, &state.database, &state.name)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to read branch {}/{}/{}",
                    state.organization, state.database, state.name
                ))
            })?;

        state.apply(&branch);
        encode_state(&state)
    }

    async fn delete(&self, current_state: Value) -> Result<(), ProviderError> {
        let client = require_client(&self.client)?;
        let state: DatabaseBranchState = decode_state(current_state)?;

        client
            .delete_branch(&state.organization, &state.database, &state.name)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to delete branch {}/{}/{}",
                    state.organization, state.database, state.name
                ))
            })?;

        info!(
            organization = %state.organization,
            database = %state.database,
            branch = %state.name,
            "deleted database branch"
        );
        Ok(())
    }

    async fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let id: BranchImportId = id.parse()?;
        let client = require_client(&self.client)?;

        let branch = client
            .get_branch(&id.organization, &id.database, &id.branch)
            .await
            .map_err(|e| e.context(format!("Unable to import branch {id}")))?;

        debug!(
            organization = %id.organization,
            database = %id.database,
            branch = %id.branch,
            "imported database branch"
        );
        let mut state = DatabaseBranchState {
            organization: id.organization,
            database: id.database,
            name: branch.name.clone(),
            ..Default::default()
        };
        state.apply(&branch);
        encode_state(&state)
    }
}
