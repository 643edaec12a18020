use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{region_type, DataSource, RegionModel};
use crate::client::SharedClient;
use crate::error::ProviderError;
use crate::resources::{decode_state, encode_state, require_client};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Deserialize)]
struct RegionsConfig {
    organization: String,
}

#[derive(Debug, Serialize)]
struct RegionsState {
    organization: String,
    regions: Vec<RegionModel>,
}

/// Lists the regions available to an organization.
pub struct RegionsDataSource {
    client: Option<SharedClient>,
}

impl RegionsDataSource {
    pub const TYPE_NAME: &'static str = "planetscale_regions";

    pub fn new(client: Option<SharedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for RegionsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Regions available to an organization.")
            .with_attribute(
                "organization",
                Attribute::required_string().with_description("The organization to list regions for."),
            )
            .with_attribute("regions", Attribute::computed_list(region_type()))
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let client = require_client(&self.client)?;
        let config: RegionsConfig = decode_state(config)?;

        let regions = client
            .list_regions(&config.organization)
            .await
            .map_err(|e| e.context(format!("Unable to list regions of {}", config.organization)))?;

        debug!(organization = %config.organization, count = regions.len(), "listed regions");
        encode_state(&RegionsState {
            regions: regions.iter().map(RegionModel::from).collect(),
            organization: config.organization,
        })
    }
}
