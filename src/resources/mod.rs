//! Managed resources.
//!
//! Each resource owns a typed state model and maps it to exactly one API call
//! per lifecycle operation. Updates are no-ops: every user-settable attribute
//! is `force_new`, so changes are planned as replacements.

mod backup;
mod database;
mod database_branch;
mod database_branch_password;
mod deploy_request;

pub use backup::BackupResource;
pub use database::DatabaseResource;
pub use database_branch::DatabaseBranchResource;
pub use database_branch_password::DatabaseBranchPasswordResource;
pub use deploy_request::DeployRequestResource;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::schema::Schema;

/// A resource type with a create/read/update/delete lifecycle.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The full type name, e.g. `planetscale_database`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Create the remote object from the planned state and return the new state.
    async fn create(&self, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh the state from the API.
    async fn read(&self, current_state: Value) -> Result<Value, ProviderError>;

    /// Update in place. No attribute supports in-place updates, so the prior
    /// state is returned without calling the API.
    async fn update(&self, prior_state: Value, planned_state: Value) -> Result<Value, ProviderError> {
        let _ = planned_state;
        Ok(prior_state)
    }

    async fn delete(&self, current_state: Value) -> Result<(), ProviderError>;

    /// Build state for an existing object from an import identifier.
    async fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "import is not supported for {}",
            self.type_name()
        )))
    }
}

/// Every resource, constructed with the same client handle.
pub fn all(client: Option<SharedClient>) -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(DatabaseResource::new(client.clone())),
        Box::new(DatabaseBranchResource::new(client.clone())),
        Box::new(DatabaseBranchPasswordResource::new(client.clone())),
        Box::new(BackupResource::new(client.clone())),
        Box::new(DeployRequestResource::new(client)),
    ]
}

/// The configured client, or the error returned before `Configure`.
pub(crate) fn require_client(client: &Option<SharedClient>) -> Result<&SharedClient, ProviderError> {
    client.as_ref().ok_or_else(ProviderError::not_configured)
}

pub(crate) fn decode_state<T: DeserializeOwned>(state: Value) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(state)?)
}

pub(crate) fn encode_state<T: Serialize>(state: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(state)?)
}

/// Non-empty string or `None`; the API treats empty strings as unset.
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

/// Region slugs accepted when creating a database.
pub(crate) const DATABASE_REGIONS: &[&str] = &[
    "us-east",
    "us-west",
    "eu-west",
    "ap-southeast",
    "ap-south",
    "ap-northeast",
    "eu-central",
    "aws-ap-southeast-2",
    "aws-sa-east-1",
    "aws-sa-east-2",
];

/// Region slugs accepted when creating a branch.
pub(crate) const BRANCH_REGIONS: &[&str] = &[
    "ap-northeast",
    "ap-south",
    "ap-southeast",
    "aws-ap-southeast-2",
    "eu-central",
    "eu-west",
    "aws-eu-west-2",
    "aws-sa-east-1",
    "us-east",
    "aws-us-east-2",
    "us-west",
    "gcp-us-central1",
    "gcp-us-east4",
    "gcp-northamerica-northeast1",
    "gcp-asia-northeast3",
];

/// Roles a branch password can be created with.
pub(crate) const PASSWORD_ROLES: &[&str] = &["admin", "reader", "writer", "readwriter"];
