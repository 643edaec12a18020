use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::DataSource;
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::DeployRequest;
use crate::resources::{decode_state, encode_state, require_client};
use crate::schema::{Attribute, AttributeType, Schema};

#[derive(Debug, Deserialize)]
struct DeployRequestsConfig {
    organization: String,
    database: String,
    number: u64,
}

#[derive(Debug, Serialize)]
struct DeployRequestModel {
    id: String,
    number: u64,
    branch: String,
    into_branch: String,
    notes: String,
    state: String,
    deployment_state: String,
    approved: bool,
    html_url: String,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl From<DeployRequest> for DeployRequestModel {
    fn from(request: DeployRequest) -> Self {
        Self {
            id: request.id,
            number: request.number,
            branch: request.branch,
            into_branch: request.into_branch,
            notes: request.notes,
            state: request.state,
            deployment_state: request.deployment_state,
            approved: request.approved,
            html_url: request.html_url,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct DeployRequestsState {
    organization: String,
    database: String,
    number: u64,
    deploy_request: DeployRequestModel,
}

/// Looks up a single deploy request by number.
pub struct DeployRequestsDataSource {
    client: Option<SharedClient>,
}

impl DeployRequestsDataSource {
    pub const TYPE_NAME: &'static str = "planetscale_deploy_requests";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for DeployRequestsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A deploy request of a database, looked up by number.")
            .with_attribute("organization", Attribute::required_string())
            .with_attribute("database", Attribute::required_string())
            .with_attribute(
                "number",
                Attribute::required_int64().with_description("Number of the deploy request."),
            )
            .with_attribute(
                "deploy_request",
                Attribute::computed_object(AttributeType::object([
                    ("id", AttributeType::String),
                    ("number", AttributeType::Int64),
                    ("branch", AttributeType::String),
                    ("into_branch", AttributeType::String),
                    ("notes", AttributeType::String),
                    ("state", AttributeType::String),
                    ("deployment_state", AttributeType::String),
                    ("approved", AttributeType::Bool),
                    ("html_url", AttributeType::String),
                    ("created_at", AttributeType::String),
                    ("updated_at", AttributeType::String),
                ])),
            )
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let config: DeployRequestsConfig = decode_state(config)?;

        let request = client
            .get_deploy_request(&config.organization, &config.database, config.number)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to read deploy request #{} on {}/{}",
                    config.number, config.organization, config.database
                ))
            })?;

        debug!(
            organization = %config.organization,
            database = %config.database,
            number = config.number,
            "read deploy request"
        );
        encode_state(&DeployRequestsState {
            organization: config.organization,
            database: config.database,
            number: config.number,
            deploy_request: request.into(),
        })
    }
}
