use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{decode_state, encode_state, require_client, Resource};
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::Backup;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// State of `planetscale_backup`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupState {
    pub organization: String,
    pub database: String,
    pub branch: String,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl BackupState {
    fn apply(&mut self, backup: &Backup) {
        self.public_id = Some(backup.public_id.clone());
        self.name = Some(backup.name.clone());
        self.state = Some(backup.state.clone());
        self.size = Some(backup.size);
        self.created_at = backup.created_at.clone();
        self.updated_at = backup.updated_at.clone();
        self.started_at = backup.started_at.clone();
        self.expires_at = backup.expires_at.clone();
        self.completed_at = backup.completed_at.clone();
    }

    fn public_id(&self) -> Result<&str, ProviderError> {
        self.public_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ProviderError::Validation(format!(
                    "backup of branch {}/{}/{} has no public_id in state",
                    self.organization, self.database, self.branch
                ))
            })
    }
}

/// A backup of a database branch.
pub struct BackupResource {
    client: Option<SharedClient>,
}

impl BackupResource {
    pub const TYPE_NAME: &'static str = "planetscale_backup";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for BackupResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A backup of a database branch.")
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
                    .with_description("The database to back up."),
            )
            .with_attribute(
                "branch",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The branch to back up."),
            )
            .with_attribute(
                "public_id",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_force_new()
                    .with_description("Public ID of the backup."),
            )
            .with_attribute(
                "name",
                Attribute::computed_string().with_description("Name of the backup."),
            )
            .with_attribute(
                "state",
                Attribute::computed_string().with_description(
                    "State of the backup: pending, running, success, failed or canceled.",
                ),
            )
            .with_attribute(
                "size",
                Attribute::computed_int64().with_description("Size of the backup in bytes."),
            )
            .with_attribute("created_at", Attribute::computed_string())
            .with_attribute("updated_at", Attribute::computed_string())
            .with_attribute("started_at", Attribute::computed_string())
            .with_attribute(
                "expires_at",
                Attribute::computed_string().with_description("When a completed backup expires."),
            )
            .with_attribute("completed_at", Attribute::computed_string())
    }

    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: BackupState = decode_state(planned_state)?;

        let backup = client
            .create_backup(&state.organization, &state.database, &state.branch)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to create backup of branch {}/{}/{}",
                    state.organization, state.database, state.branch
                ))
            })?;

        info!(
            organization = %state.organization,
            database = %state.database,
            branch = %state.branch,
            backup = %backup.public_id,
            "created backup"
        );
        state.apply(&backup);
        encode_state(&state)
    }

    async fn read(&self, current_state: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let mut state: BackupState = decode_state(current_state)?;

        let backup = client
            .get_backup(
                &state.organization,
                &state.database,
                &state.branch,
                state.public_id()?,
            )
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to read backup of branch {}/{}/{}",
                    state.organization, state.database, state.branch
                ))
            })?;

        state.apply(&backup);
        encode_state(&state)
    }

    async fn delete(&self, current_state: Value) -> Result<(), ProviderError> {
        let client = require_client(&self.client)?;
        let state: BackupState = decode_state(current_state)?;
        let public_id = state.public_id()?;

        client
            .delete_backup(&state.organization, &state.database, &state.branch, public_id)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to delete backup {} of branch {}/{}/{}",
                    public_id, state.organization, state.database, state.branch
                ))
            })?;

        info!(
            organization = %state.organization,
            database = %state.database,
            branch = %state.branch,
            backup = %public_id,
            "deleted backup"
        );
        Ok(())
    }
}
