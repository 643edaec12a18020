//! gRPC plumbing for serving a provider to the host.
//!
//! [`ProviderService`] is the typed surface a provider implements; the
//! wrapper here translates it to the generated `provider.v1` service,
//! turning errors into diagnostics. [`serve`] binds a listener, prints the
//! handshake line and runs until SIGTERM or SIGINT.
//!
//! # Shutdown
//!
//! On a signal the server stops accepting connections and drains in-flight
//! requests for at most [`ServeOptions::shutdown_timeout`], then calls the
//! provider's `stop()`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::generated as proto;
use crate::schema::{has_errors, Diagnostic, DiagnosticSeverity, ProviderSchema, Schema};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};

/// The operations a provider exposes to the host, in plain Rust types.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Schemas of the provider configuration, resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Names of the supported types and server capabilities.
    fn metadata(&self) -> ProviderMetadata;

    /// Validate the provider configuration before `configure`.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Configure the provider; error diagnostics leave it unconfigured.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Drop any configuration. Called when a Configure payload cannot be decoded.
    fn reset(&self);

    /// Called on shutdown.
    async fn stop(&self) -> Result<(), ProviderError>;

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Upgrade state written by an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError>;

    /// Compute the planned state; `prior_state` is `None` on create.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Build state for an existing remote object from an import identifier.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError>;

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError>;

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError>;
}

/// Empty payloads decode to null.
fn decode_payload(bytes: &[u8]) -> Result<Value, ProviderError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn encode_payload(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

fn diagnostic_to_proto(diagnostic: Diagnostic) -> proto::Diagnostic {
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Error => proto::diagnostic::Severity::Error,
        DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning,
    };
    proto::Diagnostic {
        severity: severity as i32,
        summary: diagnostic.summary,
        detail: diagnostic.detail.unwrap_or_default(),
        attribute: diagnostic.attribute.unwrap_or_default(),
    }
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics.into_iter().map(diagnostic_to_proto).collect()
}

fn error_to_proto(err: &ProviderError) -> Vec<proto::Diagnostic> {
    vec![diagnostic_to_proto(err.to_diagnostic())]
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version as i64,
        block: Some(proto::Block {
            attributes: schema
                .block
                .attributes
                .iter()
                .map(|(name, attr)| proto::Attribute {
                    name: name.clone(),
                    r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
                    required: attr.flags.required,
                    optional: attr.flags.optional,
                    computed: attr.flags.computed,
                    sensitive: attr.flags.sensitive,
                    description: attr.description.clone().unwrap_or_default(),
                    force_new: attr.force_new,
                    one_of: attr.one_of.clone(),
                })
                .collect(),
            description: schema.block.description.clone().unwrap_or_default(),
        }),
    }
}

/// Log the outcome of a validate/configure call and convert it.
fn diagnostics_outcome(
    operation: &'static str,
    result: Result<Vec<Diagnostic>, ProviderError>,
) -> Vec<proto::Diagnostic> {
    match result {
        Ok(diagnostics) => {
            if has_errors(&diagnostics) {
                warn!(operation, diagnostics = diagnostics.len(), "completed with errors");
            } else {
                debug!(operation, "completed");
            }
            diagnostics_to_proto(diagnostics)
        }
        Err(e) => {
            error!(operation, error = %e, "failed");
            error_to_proto(&e)
        }
    }
}

/// Log the outcome of a state-producing call and convert it.
fn state_outcome(
    operation: &'static str,
    result: Result<Value, ProviderError>,
) -> (Vec<u8>, Vec<proto::Diagnostic>) {
    match result {
        Ok(state) => {
            debug!(operation, "completed");
            (encode_payload(&state), Vec::new())
        }
        Err(e) => {
            error!(operation, error = %e, "failed");
            (Vec::new(), error_to_proto(&e))
        }
    }
}

/// Adapts a [`ProviderService`] to the generated gRPC trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

#[tonic::async_trait]
impl<P: ProviderService> proto::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<proto::GetMetadataRequest>,
    ) -> Result<tonic::Response<proto::GetMetadataResponse>, tonic::Status> {
        let metadata = self.provider.metadata();
        debug!(
            resources = metadata.resources.len(),
            data_sources = metadata.data_sources.len(),
            "GetMetadata completed"
        );
        Ok(tonic::Response::new(proto::GetMetadataResponse {
            server_capabilities: Some(proto::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            data_sources: metadata.data_sources,
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<proto::GetSchemaRequest>,
    ) -> Result<tonic::Response<proto::GetSchemaResponse>, tonic::Status> {
        let schema = self.provider.schema();
        Ok(tonic::Response::new(proto::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            data_sources: schema
                .data_sources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<proto::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateProviderConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_payload(&req.config)?;
            self.provider.validate_provider_config(config).await
        }
        .await;
        Ok(tonic::Response::new(proto::ValidateProviderConfigResponse {
            diagnostics: diagnostics_outcome("ValidateProviderConfig", result),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<proto::ConfigureRequest>,
    ) -> Result<tonic::Response<proto::ConfigureResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = match decode_payload(&req.config) {
            Ok(config) => self.provider.configure(config).await,
            Err(err) => {
                self.provider.reset();
                Err(err)
            }
        };
        Ok(tonic::Response::new(proto::ConfigureResponse {
            diagnostics: diagnostics_outcome("Configure", result),
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<proto::StopRequest>,
    ) -> Result<tonic::Response<proto::StopResponse>, tonic::Status> {
        info!("Stop called");
        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            }
        };
        Ok(tonic::Response::new(proto::StopResponse { error }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<proto::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_payload(&req.config)?;
            self.provider
                .validate_resource_config(&req.resource_type, config)
                .await
        }
        .await;
        Ok(tonic::Response::new(proto::ValidateResourceConfigResponse {
            diagnostics: diagnostics_outcome("ValidateResourceConfig", result),
        }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<proto::UpgradeResourceStateRequest>,
    ) -> Result<tonic::Response<proto::UpgradeResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let state = decode_payload(&req.raw_state)?;
            self.provider
                .upgrade_resource_state(&req.resource_type, req.version, state)
                .await
        }
        .await;
        let (upgraded_state, diagnostics) = state_outcome("UpgradeResourceState", result);
        Ok(tonic::Response::new(proto::UpgradeResourceStateResponse {
            upgraded_state,
            diagnostics,
        }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.plan")]
    async fn plan(
        &self,
        request: tonic::Request<proto::PlanRequest>,
    ) -> Result<tonic::Response<proto::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let prior_state = if req.prior_state.is_empty() {
                None
            } else {
                Some(decode_payload(&req.prior_state)?)
            };
            let proposed_state = decode_payload(&req.proposed_state)?;
            let config = decode_payload(&req.config)?;
            self.provider
                .plan(&req.resource_type, prior_state, proposed_state, config)
                .await
        }
        .await;

        let response = match result {
            Ok(plan) => {
                info!(
                    changes = plan.changes.len(),
                    requires_replace = plan.requires_replace,
                    "Plan completed"
                );
                proto::PlanResponse {
                    planned_state: encode_payload(&plan.planned_state),
                    changes: plan.changes.into_iter().map(Into::into).collect(),
                    requires_replace: plan.requires_replace,
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                error!(error = %e, "Plan failed");
                proto::PlanResponse {
                    diagnostics: error_to_proto(&e),
                    ..Default::default()
                }
            }
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.create")]
    async fn create(
        &self,
        request: tonic::Request<proto::CreateRequest>,
    ) -> Result<tonic::Response<proto::CreateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Create called");
        let result = async {
            let planned_state = decode_payload(&req.planned_state)?;
            self.provider.create(&req.resource_type, planned_state).await
        }
        .await;
        let (state, diagnostics) = state_outcome("Create", result);
        Ok(tonic::Response::new(proto::CreateResponse { state, diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.read")]
    async fn read(
        &self,
        request: tonic::Request<proto::ReadRequest>,
    ) -> Result<tonic::Response<proto::ReadResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let current_state = decode_payload(&req.current_state)?;
            self.provider.read(&req.resource_type, current_state).await
        }
        .await;
        let (state, diagnostics) = state_outcome("Read", result);
        Ok(tonic::Response::new(proto::ReadResponse { state, diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.update")]
    async fn update(
        &self,
        request: tonic::Request<proto::UpdateRequest>,
    ) -> Result<tonic::Response<proto::UpdateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Update called");
        let result = async {
            let prior_state = decode_payload(&req.prior_state)?;
            let planned_state = decode_payload(&req.planned_state)?;
            self.provider
                .update(&req.resource_type, prior_state, planned_state)
                .await
        }
        .await;
        let (state, diagnostics) = state_outcome("Update", result);
        Ok(tonic::Response::new(proto::UpdateResponse { state, diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type), name = "grpc.delete")]
    async fn delete(
        &self,
        request: tonic::Request<proto::DeleteRequest>,
    ) -> Result<tonic::Response<proto::DeleteResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Delete called");
        let result = async {
            let current_state = decode_payload(&req.current_state)?;
            self.provider.delete(&req.resource_type, current_state).await
        }
        .await;
        let diagnostics = match result {
            Ok(()) => {
                info!("Delete completed");
                vec![]
            }
            Err(e) => {
                error!(error = %e, "Delete failed");
                error_to_proto(&e)
            }
        };
        Ok(tonic::Response::new(proto::DeleteResponse { diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type = %request.get_ref().resource_type, id = %request.get_ref().id), name = "grpc.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: tonic::Request<proto::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<proto::ImportResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        let response = match self.provider.import_resource(&req.resource_type, &req.id).await {
            Ok(imported) => {
                info!(imported = imported.len(), "ImportResourceState completed");
                proto::ImportResourceStateResponse {
                    imported: imported
                        .into_iter()
                        .map(|r| proto::ImportedResource {
                            state: encode_payload(&r.state),
                            resource_type: r.resource_type,
                        })
                        .collect(),
                    diagnostics: vec![],
                }
            }
            Err(e) => {
                error!(error = %e, "ImportResourceState failed");
                proto::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_to_proto(&e),
                }
            }
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(data_source_type = %request.get_ref().data_source_type), name = "grpc.validate_data_source_config")]
    async fn validate_data_source_config(
        &self,
        request: tonic::Request<proto::ValidateDataSourceConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateDataSourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_payload(&req.config)?;
            self.provider
                .validate_data_source_config(&req.data_source_type, config)
                .await
        }
        .await;
        Ok(tonic::Response::new(proto::ValidateDataSourceConfigResponse {
            diagnostics: diagnostics_outcome("ValidateDataSourceConfig", result),
        }))
    }

    #[instrument(skip(self, request), fields(data_source_type = %request.get_ref().data_source_type), name = "grpc.read_data_source")]
    async fn read_data_source(
        &self,
        request: tonic::Request<proto::ReadDataSourceRequest>,
    ) -> Result<tonic::Response<proto::ReadDataSourceResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_payload(&req.config)?;
            self.provider
                .read_data_source(&req.data_source_type, config)
                .await
        }
        .await;
        let (state, diagnostics) = state_outcome("ReadDataSource", result);
        Ok(tonic::Response::new(proto::ReadDataSourceResponse { state, diagnostics }))
    }
}

/// Options for running the provider server.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// How long in-flight requests may drain after a shutdown signal.
    /// Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// The line printed on stdout for the host to connect.
pub fn handshake_line(addr: SocketAddr) -> String {
    format!("{HANDSHAKE_PREFIX}|{PROTOCOL_VERSION}|{addr}")
}

/// Wait for SIGTERM or SIGINT (CTRL+C on Windows).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");
        info!("received CTRL+C, shutting down");
    }

    #[cfg(not(any(unix, windows)))]
    {
        std::future::pending::<()>().await;
    }
}

/// Serve a provider on an ephemeral localhost port.
///
/// Prints `PROVIDER_PLUGIN|<version>|<address>` on stdout once the listener
/// is bound, then serves until a shutdown signal arrives.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Like [`serve`] with custom options.
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve_on_listener(provider, listener, options).await
}

/// Serve a provider on a fixed address.
pub async fn serve_on<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    serve_on_listener(provider, listener, ServeOptions::default()).await
}

async fn serve_on_listener<P: ProviderService>(
    provider: P,
    listener: TcpListener,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = listener.local_addr()?;
    println!("{}", handshake_line(addr));
    info!(address = %addr, "provider server starting");

    let provider = Arc::new(provider);
    let service = proto::provider_server::ProviderServer::new(ProviderGrpcService {
        provider: Arc::clone(&provider),
    });

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = Server::builder()
        .add_service(service)
        .serve_with_incoming_shutdown(
            tokio_stream::wrappers::TcpListenerStream::new(listener),
            async move {
                wait_for_shutdown_signal().await;
                let _ = signalled_tx.send(());
            },
        );
    tokio::pin!(server);

    // The drain deadline only starts once a signal has been received.
    let drain_deadline = async {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(options.shutdown_timeout).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = &mut server => {
            if let Err(e) = result {
                error!(error = %e, "server error");
                return Err(e.into());
            }
            info!("server shutdown complete");
        }
        _ = drain_deadline => {
            warn!(timeout = ?options.shutdown_timeout, "shutdown timeout exceeded, forcing shutdown");
        }
    }

    if let Err(e) = provider.stop().await {
        warn!(error = %e, "provider stop returned an error");
    }
    info!("provider shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENV_SERVICE_TOKEN, ENV_SERVICE_TOKEN_ID};
    use crate::models::Database;
    use crate::provider::PlanetScaleProvider;
    use crate::testing::FakeApi;
    use proto::provider_server::Provider;
    use serde_json::json;
    use std::collections::HashMap;

    fn configured(fake: &FakeApi) -> ProviderGrpcService<PlanetScaleProvider> {
        let env: HashMap<String, String> = [
            (ENV_SERVICE_TOKEN_ID.to_string(), "id".to_string()),
            (ENV_SERVICE_TOKEN.to_string(), "secret".to_string()),
        ]
        .into_iter()
        .collect();
        ProviderGrpcService {
            provider: Arc::new(
                PlanetScaleProvider::new()
                    .with_env(env)
                    .with_client_factory(fake.factory()),
            ),
        }
    }

    #[test]
    fn test_handshake_line() {
        let addr: SocketAddr = "127.0.0.1:50051".parse().unwrap();
        assert_eq!(handshake_line(addr), "PROVIDER_PLUGIN|1|127.0.0.1:50051");
    }

    #[test]
    fn test_serve_options() {
        assert_eq!(ServeOptions::new().shutdown_timeout, Duration::from_secs(30));
        let options = ServeOptions::new().with_shutdown_timeout(Duration::from_secs(5));
        assert_eq!(options.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload(b"").unwrap(), Value::Null);
        assert_eq!(decode_payload(br#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert!(matches!(
            decode_payload(b"{not json"),
            Err(ProviderError::Serialization(_))
        ));
    }

    #[test]
    fn test_schema_to_proto_carries_flags() {
        let schema = crate::resources::all(None)
            .into_iter()
            .find(|r| r.type_name() == "planetscale_database_branch_password")
            .unwrap()
            .schema();
        let proto = schema_to_proto(&schema);
        let block = proto.block.unwrap();

        let role = block.attributes.iter().find(|a| a.name == "role").unwrap();
        assert!(role.optional);
        assert!(role.force_new);
        assert_eq!(role.one_of.len(), 4);

        let plaintext = block.attributes.iter().find(|a| a.name == "plaintext").unwrap();
        assert!(plaintext.computed);
        assert!(plaintext.sensitive);
        assert_eq!(plaintext.r#type, b"\"string\"".to_vec());
    }

    #[tokio::test]
    async fn test_get_schema_lists_types() {
        let service = configured(&FakeApi::new());
        let response = service
            .get_schema(tonic::Request::new(proto::GetSchemaRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert!(response.provider.is_some());
        assert!(response.resources.contains_key("planetscale_database"));
        assert!(response.data_sources.contains_key("planetscale_regions"));
    }

    #[tokio::test]
    async fn test_configure_then_create() {
        let fake = FakeApi::new();
        let service = configured(&fake);

        let configure = service
            .configure(tonic::Request::new(proto::ConfigureRequest { config: vec![] }))
            .await
            .unwrap()
            .into_inner();
        assert!(configure.diagnostics.is_empty());

        let planned = json!({"organization": "acme", "name": "mydb", "notes": null, "region": null});
        let create = service
            .create(tonic::Request::new(proto::CreateRequest {
                resource_type: "planetscale_database".to_string(),
                planned_state: serde_json::to_vec(&planned).unwrap(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(create.diagnostics.is_empty());
        let state: Value = serde_json::from_slice(&create.state).unwrap();
        assert_eq!(state["name"], "mydb");
        assert_eq!(state["region"], FakeApi::DEFAULT_REGION);
    }

    #[tokio::test]
    async fn test_errors_become_diagnostics() {
        let service = configured(&FakeApi::new());

        let read = service
            .read(tonic::Request::new(proto::ReadRequest {
                resource_type: "planetscale_database".to_string(),
                current_state: br#"{"organization":"acme","name":"mydb"}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(read.state.is_empty());
        assert_eq!(read.diagnostics.len(), 1);
        assert!(read.diagnostics[0].summary.contains("not configured"));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_reported() {
        let service = configured(&FakeApi::new());
        let response = service
            .validate_resource_config(tonic::Request::new(proto::ValidateResourceConfigRequest {
                resource_type: "planetscale_database".to_string(),
                config: b"{".to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.starts_with("Serialization error"));
    }

    #[tokio::test]
    async fn test_undecodable_configure_drops_client() {
        let service = configured(&FakeApi::new());
        service
            .configure(tonic::Request::new(proto::ConfigureRequest {
                config: b"{}".to_vec(),
            }))
            .await
            .unwrap();
        assert!(service.provider.is_configured());

        let response = service
            .configure(tonic::Request::new(proto::ConfigureRequest {
                config: b"not json".to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.starts_with("Serialization error"));
        assert!(!service.provider.is_configured());
    }

    #[tokio::test]
    async fn test_import_through_grpc() {
        let fake = FakeApi::new();
        fake.insert_database(
            "acme",
            Database {
                name: "mydb".to_string(),
                ..Default::default()
            },
        );
        let service = configured(&fake);
        service
            .configure(tonic::Request::new(proto::ConfigureRequest { config: vec![] }))
            .await
            .unwrap();

        let response = service
            .import_resource_state(tonic::Request::new(proto::ImportResourceStateRequest {
                resource_type: "planetscale_database".to_string(),
                id: "acme/mydb".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.diagnostics.is_empty());
        assert_eq!(response.imported.len(), 1);
        assert_eq!(response.imported[0].resource_type, "planetscale_database");
    }
}
