use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::DataSource;
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::DatabaseBranchPassword;
use crate::resources::{decode_state, encode_state, require_client};
use crate::schema::{Attribute, AttributeType, Schema};

#[derive(Debug, Deserialize)]
struct PasswordsConfig {
    organization: String,
    database: String,
    branch: String,
}

#[derive(Debug, Serialize)]
struct PasswordModel {
    name: String,
    username: String,
    hostname: String,
    plaintext: String,
    public_id: String,
    role: String,
}

impl From<&DatabaseBranchPassword> for PasswordModel {
    fn from(password: &DatabaseBranchPassword) -> Self {
        Self {
            name: password.name.clone(),
            username: password.username.clone(),
            hostname: password.hostname.clone(),
            plaintext: password.plaintext.clone(),
            public_id: password.public_id.clone(),
            role: password.role.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PasswordsState {
    organization: String,
    database: String,
    branch: String,
    passwords: Vec<PasswordModel>,
}

/// Lists the passwords of a database branch.
pub struct DatabaseBranchPasswordsDataSource {
    client: Option<SharedClient>,
}

impl DatabaseBranchPasswordsDataSource {
    pub const TYPE_NAME: &'static str = "planetscale_database_branch_passwords";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for DatabaseBranchPasswordsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("All passwords of a database branch.")
            .with_attribute("organization", Attribute::required_string())
            .with_attribute("database", Attribute::required_string())
            .with_attribute("branch", Attribute::required_string())
            .with_attribute(
                "passwords",
                Attribute::computed_list(AttributeType::object([
                    ("name", AttributeType::String),
                    ("username", AttributeType::String),
                    ("hostname", AttributeType::String),
                    ("plaintext", AttributeType::String),
                    ("public_id", AttributeType::String),
                    ("role", AttributeType::String),
                ]))
                .sensitive()
                .with_description("Passwords of the branch. `plaintext` is only set by the API on creation."),
            )
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let config: PasswordsConfig = decode_state(config)?;

        let passwords = client
            .list_passwords(&config.organization, &config.database, &config.branch)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Unable to list passwords of branch {}/{}/{}",
                    config.organization, config.database, config.branch
                ))
            })?;

        debug!(
            organization = %config.organization,
            database = %config.database,
            branch = %config.branch,
            count = passwords.len(),
            "listed database branch passwords"
        );
        encode_state(&PasswordsState {
            passwords: passwords.iter().map(PasswordModel::from).collect(),
            organization: config.organization,
            database: config.database,
            branch: config.branch,
        })
    }
}
