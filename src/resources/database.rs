use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{decode_state, encode_state, non_empty, require_client, Resource, DATABASE_REGIONS};
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::import_id::DatabaseImportId;
use crate::models::{CreateDatabaseRequest, Database};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// State of `planetscale_database`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseState {
    pub organization: String,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl DatabaseState {
    fn apply(&mut self, database: &Database) {
        if self.region.is_none() && !database.region.slug.is_empty() {
            self.region = Some(database.region.slug.clone());
        }
        self.html_url = Some(database.html_url.clone());
        self.state = Some(database.state.clone());
    }
}

/// A PlanetScale database.
pub struct DatabaseResource {
    client: Option<SharedClient>,
}

impl DatabaseResource {
    pub const TYPE_NAME: &'static str = "planetscale_database";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for DatabaseResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "A PlanetScale database. Once created, the database can be managed with the \
                 PlanetScale web UI or CLI.",
            )
            .with_attribute(
                "organization",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The organization the database is created in."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Name of the database, unique within the organization."),
            )
            .with_attribute(
                "notes",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("Notes visible to members of the organization."),
            )
            .with_attribute(
                "region",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_force_new()
                    .with_one_of(DATABASE_REGIONS.iter().copied())
                    .with_description(
                        "Region of the database. Defaults to the organization's default region.",
                    ),
            )
            .with_attribute(
                "html_url",
                Attribute::computed_string().with_description("URL of the database in the web UI."),
            )
            .with_attribute(
                "state",
                Attribute::computed_string()
                    .with_description("State of the database, e.g. pending or ready."),
            )
    }

    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: DatabaseState = decode_state(planned_state)?;

        let database = client
            .create_database(&CreateDatabaseRequest {
                organization: state.organization.clone(),
                name: state.name.clone(),
                notes: non_empty(&state.notes),
                region: non_empty(&state.region),
            })
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to create database {}/{}",
                    state.organization, state.name
                ))
            })?;

        info!(organization = %state.organization, database = %state.name, "created database");
        state.apply(&database);
        encode_state(&state)
    }

    async fn read(&self, current_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: DatabaseState = decode_state(current_state)?;

        let database = client
            .get_database(&state.organization, &state.name)
            .await
            .map_err(|e| {
                e.context(format!("Unable to read database {}/{}", state.organization, state.name))
            })?;

        state.apply(&database);
        encode_state(&state)
    }

    async fn delete(&self, current_state: Value) -> Result<(), ProviderError> {
        let client = require_client(&self.client)?;
        let state: DatabaseState = decode_state(current_state)?;

        client
            .delete_database(&state.organization, &state.name)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to delete database {}/{}",
                    state.organization, state.name
                ))
            })?;

        debug!(organization = %state.organization, database = %state.name, "deleted database");
        Ok(())
    }

    async fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let id: DatabaseImportId = id.parse()?;
        let client = require_client(&self.client)?;

        let database = client
            .get_database(&id.organization, &id.database)
            .await
            .map_err(|e| e.context(format!("Unable to import database {id}")))?;

        debug!(organization = %id.organization, database = %id.database, "imported database");
        encode_state(&DatabaseState {
            organization: id.organization,
            name: database.name,
            notes: non_empty(&Some(database.notes)),
            region: non_empty(&Some(database.region.slug)),
            html_url: Some(database.html_url),
            state: Some(database.state),
        })
    }
}
