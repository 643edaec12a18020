//! Read-only data sources.

mod backups;
mod database_branch_passwords;
mod database_branches;
mod databases;
mod deploy_requests;
mod regions;

pub use backups::BackupsDataSource;
pub use database_branch_passwords::DatabaseBranchPasswordsDataSource;
pub use database_branches::DatabaseBranchesDataSource;
pub use databases::DatabasesDataSource;
pub use deploy_requests::DeployRequestsDataSource;
pub use regions::RegionsDataSource;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::models::Region;
use crate::schema::{AttributeType, Schema};

/// A data source type.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The full type name, e.g. `planetscale_regions`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Query the API using `config` and return the resulting state.
    async fn read(&self, config: Value) -> Result<Value, ProviderError>;
}

/// Every data source, constructed with the same client handle.
pub fn all(client: Option<SharedClient>) -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(DatabasesDataSource::new(client.clone())),
        Box::new(DatabaseBranchesDataSource::new(client.clone())),
        Box::new(DatabaseBranchPasswordsDataSource::new(client.clone())),
        Box::new(BackupsDataSource::new(client.clone())),
        Box::new(DeployRequestsDataSource::new(client.clone())),
        Box::new(RegionsDataSource::new(client)),
    ]
}

/// A region as exposed in data source state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct RegionModel {
    pub name: String,
    pub slug: String,
    pub location: String,
    pub enabled: bool,
}

impl From<&Region> for RegionModel {
    fn from(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
            slug: region.slug.clone(),
            location: region.location.clone(),
            enabled: region.enabled,
        }
    }
}

pub(crate) fn region_type() -> AttributeType {
    AttributeType::object([
        ("name", AttributeType::String),
        ("slug", AttributeType::String),
        ("location", AttributeType::String),
        ("enabled", AttributeType::Bool),
    ])
}
