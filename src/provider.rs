//! The PlanetScale provider: configuration, adapter registry and dispatch.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{default_client_factory, ClientFactory, SharedClient};
use crate::config::{resolve, EnvSource, ProcessEnv, ProviderConfig};
use crate::data_sources::{self, DataSource};
use crate::error::ProviderError;
use crate::plan;
use crate::resources::{self, Resource};
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities};
use crate::validation::validate;

/// Resources and data sources built around one client handle.
struct Registry {
    configured: bool,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl Registry {
    fn new(client: Option<SharedClient>) -> Self {
        Self {
            configured: client.is_some(),
            resources: resources::all(client.clone())
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: data_sources::all(client)
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
        }
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(Box::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(Box::as_ref)
            .ok_or_else(|| {
                ProviderError::UnknownResource(format!("data source {data_source_type}"))
            })
    }
}

/// The PlanetScale provider.
///
/// Until `Configure` succeeds every adapter is built without a client;
/// schema, metadata and validation work, API operations fail with
/// [`ProviderError::not_configured`].
pub struct PlanetScaleProvider {
    registry: RwLock<Arc<Registry>>,
    client_factory: ClientFactory,
    env: Arc<dyn EnvSource>,
}

impl Default for PlanetScaleProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanetScaleProvider {
    /// A provider reading the process environment and building the reqwest client.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Arc::new(Registry::new(None))),
            client_factory: default_client_factory(),
            env: Arc::new(ProcessEnv),
        }
    }

    /// Replace how the API client is built once credentials are resolved.
    pub fn with_client_factory(mut self, factory: ClientFactory) -> Self {
        self.client_factory = factory;
        self
    }

    /// Replace the environment credentials fall back to.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Whether `Configure` has produced a client.
    pub fn is_configured(&self) -> bool {
        self.registry().configured
    }

    fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn publish(&self, client: Option<SharedClient>) {
        let registry = Arc::new(Registry::new(client));
        *self.registry.write().unwrap_or_else(PoisonError::into_inner) = registry;
    }
}

#[async_trait::async_trait]
impl ProviderService for PlanetScaleProvider {
    fn schema(&self) -> ProviderSchema {
        let registry = self.registry();
        let mut schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        for (name, resource) in &registry.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &registry.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    fn metadata(&self) -> ProviderMetadata {
        let registry = self.registry();
        ProviderMetadata {
            resources: registry.resources.keys().map(|k| k.to_string()).collect(),
            data_sources: registry.data_sources.keys().map(|k| k.to_string()).collect(),
            capabilities: ServerCapabilities { plan_destroy: true },
        }
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&ProviderConfig::schema(), &config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        info!("configuring PlanetScale client");
        let config = match ProviderConfig::from_value(&config) {
            Ok(config) => config,
            Err(err) => {
                self.publish(None);
                return Err(err);
            }
        };

        let resolved = match resolve(&config, self.env.as_ref()) {
            Ok(resolved) => resolved,
            Err(diagnostics) => {
                warn!(errors = diagnostics.len(), "PlanetScale provider configuration is incomplete");
                self.publish(None);
                return Ok(diagnostics);
            }
        };

        info!(
            service_token_id = %resolved.credentials.token_id,
            api_url = %resolved.api_url,
            "creating PlanetScale client"
        );
        match (self.client_factory)(&resolved) {
            Ok(client) => {
                self.publish(Some(client));
                info!(success = true, "configured PlanetScale client");
                Ok(Vec::new())
            }
            Err(err) => {
                self.publish(None);
                Ok(vec![Diagnostic::error("Unable to create PlanetScale API client")
                    .with_detail(format!(
                        "An unexpected error occurred when creating the PlanetScale API client: {err}"
                    ))])
            }
        }
    }

    fn reset(&self) {
        debug!("dropping PlanetScale client");
        self.publish(None);
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        debug!("stopping PlanetScale provider");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let registry = self.registry();
        let resource = registry.resource(resource_type)?;
        Ok(validate(&resource.schema(), &config))
    }

    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let registry = self.registry();
        let schema = registry.resource(resource_type)?.schema();
        if version < 0 || version as u64 > schema.version {
            return Err(ProviderError::Validation(format!(
                "cannot upgrade {resource_type} state from version {version}; the current schema version is {}",
                schema.version
            )));
        }
        Ok(state)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let registry = self.registry();
        let resource = registry.resource(resource_type)?;
        plan::plan(&resource.schema(), prior_state.as_ref(), &proposed_state)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let registry = self.registry();
        registry.resource(resource_type)?.create(planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let registry = self.registry();
        registry.resource(resource_type)?.read(current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let registry = self.registry();
        registry
            .resource(resource_type)?
            .update(prior_state, planned_state)
            .await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let registry = self.registry();
        registry.resource(resource_type)?.delete(current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let registry = self.registry();
        let state = registry.resource(resource_type)?.import(id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let registry = self.registry();
        let data_source = registry.data_source(data_source_type)?;
        Ok(validate(&data_source.schema(), &config))
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let registry = self.registry();
        registry.data_source(data_source_type)?.read(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENV_SERVICE_TOKEN, ENV_SERVICE_TOKEN_ID};
    use crate::schema::has_errors;
    use crate::testing::FakeApi;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_schema_lists_all_types() {
        let schema = PlanetScaleProvider::new().schema();
        assert_eq!(schema.resources.len(), 5);
        assert_eq!(schema.data_sources.len(), 6);
        assert!(schema.provider.attribute("service_token").unwrap().flags.sensitive);
    }

    #[test]
    fn test_metadata_matches_schema() {
        let provider = PlanetScaleProvider::new();
        let metadata = provider.metadata();
        let schema = provider.schema();
        assert_eq!(metadata.resources, schema.resources.keys().cloned().collect::<Vec<_>>());
        assert!(metadata.capabilities.plan_destroy);
    }

    #[tokio::test]
    async fn test_configure_publishes_client() {
        let fake = FakeApi::new();
        let provider = PlanetScaleProvider::new()
            .with_env(env(&[(ENV_SERVICE_TOKEN, "secret")]))
            .with_client_factory(fake.factory());

        let diagnostics = provider
            .configure(json!({"service_token_id": "abc"}))
            .await
            .unwrap();

        assert!(diagnostics.is_empty());
        assert!(provider.is_configured());
        let resolved = fake.resolved_configs();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].credentials.token_id, "abc");
        assert_eq!(resolved[0].credentials.token, "secret");
    }

    #[tokio::test]
    async fn test_configure_missing_token_id() {
        let fake = FakeApi::new();
        let provider = PlanetScaleProvider::new()
            .with_env(env(&[(ENV_SERVICE_TOKEN, "secret")]))
            .with_client_factory(fake.factory());

        let diagnostics = provider.configure(json!({})).await.unwrap();

        assert!(has_errors(&diagnostics));
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("service_token_id"));
        assert!(fake.resolved_configs().is_empty());
        assert!(!provider.is_configured());

        let err = provider
            .read_data_source("planetscale_regions", json!({"organization": "acme"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_factory_failure() {
        let provider = PlanetScaleProvider::new()
            .with_env(env(&[(ENV_SERVICE_TOKEN_ID, "id"), (ENV_SERVICE_TOKEN, "secret")]))
            .with_client_factory(FakeApi::failing_factory());

        let diagnostics = provider.configure(Value::Null).await.unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Unable to create PlanetScale API client");
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_failed_reconfigure_drops_client() {
        let fake = FakeApi::new();
        let provider = PlanetScaleProvider::new()
            .with_env(env(&[]))
            .with_client_factory(fake.factory());

        provider
            .configure(json!({"service_token_id": "id", "service_token": "secret"}))
            .await
            .unwrap();
        assert!(provider.is_configured());

        provider.configure(json!({})).await.unwrap();
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_mistyped_reconfigure_drops_client() {
        let fake = FakeApi::new();
        let provider = PlanetScaleProvider::new()
            .with_env(env(&[]))
            .with_client_factory(fake.factory());

        provider
            .configure(json!({"service_token_id": "id", "service_token": "secret"}))
            .await
            .unwrap();
        assert!(provider.is_configured());

        let err = provider
            .configure(json!({"service_token_id": 5}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
        assert!(!provider.is_configured());

        let err = provider
            .read("planetscale_database", json!({"organization": "myorg", "name": "mydb"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = PlanetScaleProvider::new();
        let err = provider
            .read("planetscale_cluster", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_validate_resource_config_one_of() {
        let provider = PlanetScaleProvider::new();
        let diagnostics = provider
            .validate_resource_config(
                "planetscale_database_branch_password",
                json!({
                    "organization": "acme",
                    "database": "mydb",
                    "branch": "main",
                    "name": "ci",
                    "role": "owner"
                }),
            )
            .await
            .unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("role"));
    }

    #[tokio::test]
    async fn test_upgrade_rejects_future_version() {
        let provider = PlanetScaleProvider::new();
        let state = json!({"organization": "acme", "name": "mydb"});

        let upgraded = provider
            .upgrade_resource_state("planetscale_database", 0, state.clone())
            .await
            .unwrap();
        assert_eq!(upgraded, state);

        assert!(provider
            .upgrade_resource_state("planetscale_database", 3, state)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_plan_replaces_on_change() {
        let provider = PlanetScaleProvider::new();
        let prior = json!({"organization": "acme", "name": "mydb", "notes": null, "region": "us-east"});
        let proposed = json!({"organization": "acme", "name": "mydb", "notes": "prod", "region": null});

        let result = provider
            .plan("planetscale_database", Some(prior), proposed, Value::Null)
            .await
            .unwrap();

        assert!(result.requires_replace);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "notes");
    }
}
