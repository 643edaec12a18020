use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{region_type, DataSource, RegionModel};
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::Database;
use crate::resources::{decode_state, encode_state, require_client};
use crate::schema::{Attribute, AttributeType, Schema};

#[derive(Debug, Deserialize)]
struct DatabasesConfig {
    organization: String,
}

#[derive(Debug, Serialize)]
struct DatabaseModel {
    name: String,
    notes: String,
    region: RegionModel,
    html_url: String,
    state: String,
}

impl From<&Database> for DatabaseModel {
    fn from(database: &Database) -> Self {
        Self {
            name: database.name.clone(),
            notes: database.notes.clone(),
            region: RegionModel::from(&database.region),
            html_url: database.html_url.clone(),
            state: database.state.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DatabasesState {
    organization: String,
    databases: Vec<DatabaseModel>,
}

/// Lists the databases of an organization.
pub struct DatabasesDataSource {
    client: Option<SharedClient>,
}

impl DatabasesDataSource {
    pub const TYPE_NAME: &'static str = "planetscale_databases";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for DatabasesDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("All databases of an organization.")
            .with_attribute(
                "organization",
                Attribute::required_string().with_description("The organization to list."),
            )
            .with_attribute(
                "databases",
                Attribute::computed_list(AttributeType::object([
                    ("name", AttributeType::String),
                    ("notes", AttributeType::String),
                    ("region", region_type()),
                    ("html_url", AttributeType::String),
                    ("state", AttributeType::String),
                ])),
            )
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let config: DatabasesConfig = decode_state(config)?;

        let databases = client
            .list_databases(&config.organization)
            .await
            .map_err(|e| e.context(format!("Unable to list databases of {}", config.organization)))?;

        debug!(organization = %config.organization, count = databases.len(), "listed databases");
        encode_state(&DatabasesState {
            databases: databases.iter().map(DatabaseModel::from).collect(),
            organization: config.organization,
        })
    }
}
