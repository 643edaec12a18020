use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{decode_state, encode_state, non_empty, require_client, Resource, PASSWORD_ROLES};
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::{CreatePasswordRequest, DatabaseBranchPassword};
use crate::schema::{Attribute, Schema};

/// State of `planetscale_database_branch_password`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseBranchPasswordState {
    pub organization: String,
    pub database: String,
    pub branch: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub plaintext: Option<String>,
}

impl DatabaseBranchPasswordState {
    fn apply(&mut self, password: &DatabaseBranchPassword) {
        if !password.public_id.is_empty() {
            self.public_id = Some(password.public_id.clone());
        }
        self.username = Some(password.username.clone());
        // The secret is only returned on creation.
        if !password.plaintext.is_empty() {
            self.plaintext = Some(password.plaintext.clone());
        }
    }

    fn public_id(&self) -> Result<&str, ProviderError> {
        self.public_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ProviderError::Validation(format!(
                    "password {} has no public_id in state",
                    self.name
                ))
            })
    }
}

/// A connection password for a database branch.
pub struct DatabaseBranchPasswordResource {
    client: Option<SharedClient>,
}

impl DatabaseBranchPasswordResource {
    pub const TYPE_NAME: &'static str = "planetscale_database_branch_password";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for DatabaseBranchPasswordResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A password for connecting to a database branch.")
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
                    .with_description("The database the branch belongs to."),
            )
            .with_attribute(
                "branch",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The branch the password grants access to."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Name of the password."),
            )
            .with_attribute(
                "role",
                Attribute::optional_string()
                    .with_force_new()
                    .with_one_of(PASSWORD_ROLES.iter().copied())
                    .with_description(
                        "Role of the password. Defaults to admin and cannot be changed later.",
                    ),
            )
            .with_attribute(
                "public_id",
                Attribute::computed_string().with_description("Public ID of the password."),
            )
            .with_attribute(
                "username",
                Attribute::computed_string().with_description("Username to connect with."),
            )
            .with_attribute(
                "plaintext",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The password itself. Only available after creation."),
            )
    }

    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: DatabaseBranchPasswordState = decode_state(planned_state)?;

        let password = client
            .create_password(&CreatePasswordRequest {
                organization: state.organization.clone(),
                database: state.database.clone(),
                branch: state.branch.clone(),
                name: state.name.clone(),
                role: non_empty(&state.role),
            })
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to create password {} for branch {}/{}/{}",
                    state.name, state.organization, state.database, state.branch
                ))
            })?;

        info!(
            organization = %state.organization,
            database = %state.database,
            branch = %state.branch,
            password = %state.name,
            "created database branch password"
        );
        state.apply(&password);
        encode_state(&state)
    }

    async fn read(&self, current_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: DatabaseBranchPasswordState = decode_state(current_state)?;

        let password = client
            .get_password(
                &state.organization,
                &state.database,
                &state.branch,
                state.public_id()?,
            )
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to read password {} for branch {}/{}/{}",
                    state.name, state.organization, state.database, state.branch
                ))
            })?;

        state.apply(&password);
        encode_state(&state)
    }

    async fn delete(&self, current_state: Value) -> Result<(), ProviderError> {
        let client = require_client(&self.client)?;
        let state: DatabaseBranchPasswordState = decode_state(current_state)?;

        client
            .delete_password(
                &state.organization,
                &state.database,
                &state.branch,
                state.public_id()?,
            )
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to delete password {} for branch {}/{}/{}",
                    state.name, state.organization, state.database, state.branch
                ))
            })?;

        debug!(
            organization = %state.organization,
            database = %state.database,
            branch = %state.branch,
            password = %state.name,
            "deleted database branch password"
        );
        Ok(())
    }
}
