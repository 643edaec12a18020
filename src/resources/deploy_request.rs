use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{decode_state, encode_state, non_empty, require_client, Resource};
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::{CreateDeployRequestRequest, DeployRequest};
use crate::schema::{Attribute, Schema};

/// State of `planetscale_deploy_request`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequestState {
    pub organization: String,
    pub database: String,
    pub branch: String,
    pub into_branch: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub deployment_state: Option<String>,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl DeployRequestState {
    fn apply(&mut self, request: &DeployRequest) {
        self.id = Some(request.id.clone());
        self.number = Some(request.number);
        self.state = Some(request.state.clone());
        self.deployment_state = Some(request.deployment_state.clone());
        self.approved = Some(request.approved);
        self.html_url = Some(request.html_url.clone());
        self.created_at = request.created_at.clone();
        self.updated_at = request.updated_at.clone();
    }

    fn number(&self) -> Result<u64, ProviderError> {
        self.number.ok_or_else(|| {
            ProviderError::Validation(format!(
                "deploy request {} -> {} on {}/{} has no number in state",
                self.branch, self.into_branch, self.organization, self.database
            ))
        })
    }
}

/// A deploy request merging the schema of one branch into another.
///
/// Deleting the resource closes the deploy request; deploy requests cannot be
/// deleted.
pub struct DeployRequestResource {
    client: Option<SharedClient>,
}

impl DeployRequestResource {
    pub const TYPE_NAME: &'static str = "planetscale_deploy_request";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for DeployRequestResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "A deploy request: a reviewable, non-blocking schema change from one branch \
                 into another.",
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
                    .with_description("The database the branches belong to."),
            )
            .with_attribute(
                "branch",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The branch with the schema changes."),
            )
            .with_attribute(
                "into_branch",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The branch to deploy the changes into."),
            )
            .with_attribute(
                "notes",
                Attribute::optional_string()
                    .with_force_new()
                    .with_description("Notes for the deploy request."),
            )
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "number",
                Attribute::computed_int64()
                    .with_description("Number of the deploy request within the database."),
            )
            .with_attribute("state", Attribute::computed_string())
            .with_attribute("deployment_state", Attribute::computed_string())
            .with_attribute("approved", Attribute::computed_bool())
            .with_attribute(
                "html_url",
                Attribute::computed_string()
                    .with_description("URL of the deploy request in the web UI."),
            )
            .with_attribute("created_at", Attribute::computed_string())
            .with_attribute("updated_at", Attribute::computed_string())
    }

    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: DeployRequestState = decode_state(planned_state)?;

        let request = client
            .create_deploy_request(&CreateDeployRequestRequest {
                organization: state.organization.clone(),
                database: state.database.clone(),
                branch: state.branch.clone(),
                into_branch: state.into_branch.clone(),
                notes: non_empty(&state.notes),
            })
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to create deploy request {} -> {} on {}/{}",
                    state.branch, state.into_branch, state.organization, state.database
                ))
            })?;

        info!(
            organization = %state.organization,
            database = %state.database,
            branch = %state.branch,
            into_branch = %state.into_branch,
            number = request.number,
            "created deploy request"
        );
        state.apply(&request);
        encode_state(&state)
    }

    async fn read(&self, current_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: DeployRequestState = decode_state(current_state)?;
        let number = state.number()?;

        let request = client
            .get_deploy_request(&state.organization, &state.database, number)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to read deploy request #{} on {}/{}",
                    number, state.organization, state.database
                ))
            })?;

        state.apply(&request);
        encode_state(&state)
    }

    async fn delete(&self, current_state: Value) -> Result<(), ProviderError> {
        let client = require_client(&self.client)?;
        let state: DeployRequestState = decode_state(current_state)?;
        let number = state.number()?;

        client
            .close_deploy_request(&state.organization, &state.database, number)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to close deploy request #{} on {}/{}",
                    number, state.organization, state.database
                ))
            })?;

        info!(
            organization = %state.organization,
            database = %state.database,
            branch = %state.branch,
            into_branch = %state.into_branch,
            number,
            "closed deploy request"
        );
        Ok(())
    }
}
