use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::DataSource;
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::DatabaseBranch;
use crate::resources::{decode_state, encode_state, require_client};
use crate::schema::{Attribute, AttributeType, Schema};

#[derive(Debug, Deserialize)]
struct DatabaseBranchesConfig {
    organization: String,
    database: String,
}

#[derive(Debug, Serialize)]
struct DatabaseBranchModel {
    name: String,
    parent_branch: String,
    html_url: String,
    region: String,
    access_host_url: String,
    production: bool,
    ready: bool,
}

impl From<&DatabaseBranch> for DatabaseBranchModel {
    fn from(branch: &DatabaseBranch) -> Self {
        Self {
            name: branch.name.clone(),
            parent_branch: branch.parent_branch.clone(),
            html_url: branch.html_url.clone(),
            region: branch.region.slug.clone(),
            access_host_url: branch.access_host_url.clone(),
            production: branch.production,
            ready: branch.ready,
        }
    }
}

#[derive(Debug, Serialize)]
struct DatabaseBranchesState {
    organization: String,
    database: String,
    database_branches: Vec<DatabaseBranchModel>,
}

/// Lists the branches of a database.
pub struct DatabaseBranchesDataSource {
    client: Option<SharedClient>,
}

impl DatabaseBranchesDataSource {
    pub const TYPE_NAME: &'static str = "planetscale_database_branches";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for DatabaseBranchesDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("All branches of a database.")
            .with_attribute("organization", Attribute::required_string())
            .with_attribute("database", Attribute::required_string())
            .with_attribute(
                "database_branches",
                Attribute::computed_list(AttributeType::object([
                    ("name", AttributeType::String),
                    ("parent_branch", AttributeType::String),
                    ("html_url", AttributeType::String),
                    ("region", AttributeType::String),
                    ("access_host_url", AttributeType::String),
                    ("production", AttributeType::Bool),
                    ("ready", AttributeType::Bool),
                ])),
            )
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let config: DatabaseBranchesConfig = decode_state(config)?;

        let branches = client
            .list_branches(&config.organization, &config.database)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to list branches of {}/{}",
                    config.organization, config.database
                ))
            })?;

        debug!(
            organization = %config.organization,
            database = %config.database,
            count = branches.len(),
            "listed database branches"
        );
        encode_state(&DatabaseBranchesState {
            database_branches: branches.iter().map(DatabaseBranchModel::from).collect(),
            organization: config.organization,
            database: config.database,
        })
    }
}
