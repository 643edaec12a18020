use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::DataSource;
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::Backup;
use crate::resources::{decode_state, encode_state, require_client};
use crate::schema::{Attribute, AttributeType, Schema};

#[derive(Debug, Deserialize)]
struct BackupsConfig {
    organization: String,
    database: String,
    branch: String,
}

#[derive(Debug, Serialize)]
struct BackupModel {
    name: String,
    public_id: String,
    state: String,
    size: i64,
    started_at: Option<String>,
    updated_at: Option<String>,
    completed_at: Option<String>,
    expires_at: Option<String>,
}

impl From<&Backup> for BackupModel {
    fn from(backup: &Backup) -> Self {
        Self {
            name: backup.name.clone(),
            public_id: backup.public_id.clone(),
            state: backup.state.clone(),
            size: backup.size,
            started_at: backup.started_at.clone(),
            updated_at: backup.updated_at.clone(),
            completed_at: backup.completed_at.clone(),
            expires_at: backup.expires_at.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BackupsState {
    organization: String,
    database: String,
    branch: String,
    backups: Vec<BackupModel>,
}

/// Lists the backups of a database branch.
pub struct BackupsDataSource {
    client: Option<SharedClient>,
}

impl BackupsDataSource {
    pub const TYPE_NAME: &'static str = "planetscale_backups";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for BackupsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("All backups of a database branch.")
            .with_attribute("organization", Attribute::required_string())
            .with_attribute("database", Attribute::required_string())
            .with_attribute("branch", Attribute::required_string())
            .with_attribute(
                "backups",
                Attribute::computed_list(AttributeType::object([
                    ("name", AttributeType::String),
                    ("public_id", AttributeType::String),
                    ("state", AttributeType::String),
                    ("size", AttributeType::Int64),
                    ("started_at", AttributeType::String),
                    ("updated_at", AttributeType::String),
                    ("completed_at", AttributeType::String),
                    ("expires_at", AttributeType::String),
                ])),
            )
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let config: BackupsConfig = decode_state(config)?;

        let backups = client
            .list_backups(&config.organization, &config.database, &config.branch)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to list backups of branch {}/{}/{}",
                    config.organization, config.database, config.branch
                ))
            })?;

        debug!(
            organization = %config.organization,
            database = %config.database,
            branch = %config.branch,
            count = backups.len(),
            "listed backups"
        );
        encode_state(&BackupsState {
            backups: backups.iter().map(BackupModel::from).collect(),
            organization: config.organization,
            database: config.database,
            branch: config.branch,
        })
    }
}
