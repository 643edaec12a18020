//! Minimal async client for the PlanetScale v1 REST API.
//!
//! Adapters depend on the [`PlanetScaleApi`] trait only. [`Client`] is the
//! reqwest implementation used in production; tests substitute
//! [`crate::testing::FakeApi`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::config::ResolvedConfig;
use crate::error::ProviderError;
use crate::models::{
    Backup, CreateDatabaseBranchRequest, CreateDatabaseRequest, CreateDeployRequestRequest,
    CreatePasswordRequest, Database, DatabaseBranch, DatabaseBranchPassword, DeployRequest,
    ErrorBody, ListResponse, Region,
};

/// Errors returned by the API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response body not read.
    #[error("request to the PlanetScale API failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("PlanetScale API returned {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("unable to decode PlanetScale API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The credentials cannot be sent as an HTTP header.
    #[error("invalid service token: {0}")]
    InvalidCredentials(String),

    /// The base URL cannot be extended with API paths.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of a [`ApiError::Status`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the API reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Convert into a [`ProviderError`], prefixing the message with `summary`.
    pub fn context(self, summary: impl AsRef<str>) -> ProviderError {
        let message = format!("{}: {}", summary.as_ref(), self);
        match self.status() {
            Some(404) => ProviderError::NotFound(message),
            Some(401 | 403) => ProviderError::PermissionDenied(message),
            Some(409) => ProviderError::AlreadyExists(message),
            Some(400 | 422) => ProviderError::InvalidRequest(message),
            Some(429) => ProviderError::ResourceExhausted(message),
            Some(500..=599) => ProviderError::Unavailable(message),
            _ => ProviderError::Sdk(message),
        }
    }
}

/// The API operations used by resources and data sources.
#[async_trait]
pub trait PlanetScaleApi: Send + Sync {
    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<Database, ApiError>;
    async fn get_database(&self, organization: &str, database: &str) -> Result<Database, ApiError>;
    async fn list_databases(&self, organization: &str) -> Result<Vec<Database>, ApiError>;
    async fn delete_database(&self, organization: &str, database: &str) -> Result<(), ApiError>;

    async fn create_branch(
        &self,
        request: &CreateDatabaseBranchRequest,
    ) -> Result<DatabaseBranch, ApiError>;
    async fn get_branch(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<DatabaseBranch, ApiError>;
    async fn list_branches(
        &self,
        organization: &str,
        database: &str,
    ) -> Result<Vec<DatabaseBranch>, ApiError>;
    async fn delete_branch(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<(), ApiError>;

    async fn create_password(
        &self,
        request: &CreatePasswordRequest,
    ) -> Result<DatabaseBranchPassword, ApiError>;
    async fn get_password(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        password_id: &str,
    ) -> Result<DatabaseBranchPassword, ApiError>;
    async fn list_passwords(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Vec<DatabaseBranchPassword>, ApiError>;
    async fn delete_password(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        password_id: &str,
    ) -> Result<(), ApiError>;

    async fn create_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Backup, ApiError>;
    async fn get_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        backup_id: &str,
    ) -> Result<Backup, ApiError>;
    async fn list_backups(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Vec<Backup>, ApiError>;
    async fn delete_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        backup_id: &str,
    ) -> Result<(), ApiError>;

    async fn create_deploy_request(
        &self,
        request: &CreateDeployRequestRequest,
    ) -> Result<DeployRequest, ApiError>;
    async fn get_deploy_request(
        &self,
        organization: &str,
        database: &str,
        number: u64,
    ) -> Result<DeployRequest, ApiError>;
    async fn close_deploy_request(
        &self,
        organization: &str,
        database: &str,
        number: u64,
    ) -> Result<DeployRequest, ApiError>;

    async fn list_regions(&self, organization: &str) -> Result<Vec<Region>, ApiError>;
}

/// The client handle shared by every adapter.
pub type SharedClient = Arc<dyn PlanetScaleApi>;

/// Builds the API client once configuration is resolved.
pub type ClientFactory =
    Arc<dyn Fn(&ResolvedConfig) -> Result<SharedClient, ApiError> + Send + Sync>;

/// A factory that builds the reqwest-backed [`Client`].
pub fn default_client_factory() -> ClientFactory {
    Arc::new(|config: &ResolvedConfig| -> Result<SharedClient, ApiError> {
        Ok(Arc::new(Client::new(config)?))
    })
}

/// reqwest implementation of [`PlanetScaleApi`].
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    /// Build a client authenticating with the resolved service token.
    pub fn new(config: &ResolvedConfig) -> Result<Self, ApiError> {
        if config.api_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_url.to_string()));
        }

        let mut authorization = HeaderValue::from_str(&config.credentials.authorization())
            .map_err(|_| {
                ApiError::InvalidCredentials(
                    "the service token contains characters not allowed in HTTP headers".to_string(),
                )
            })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                "terraform-provider-planetscale/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "PlanetScale API request");
        Ok(self.http.request(method, url))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let bytes = Self::execute(request).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        Self::execute(request).await.map(|_| ())
    }

    async fn execute(request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?.to_vec();
        if status.is_success() {
            return Ok(bytes);
        }

        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        let message = body.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
        tracing::debug!(status = status.as_u16(), code = ?body.code, "PlanetScale API error");
        Err(ApiError::Status {
            status: status.as_u16(),
            code: body.code,
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, segments)?).await
    }

    async fn list<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<T>, ApiError> {
        let page: ListResponse<T> = self.get(segments).await?;
        Ok(page.data)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::POST, segments)?.json(body))
            .await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, segments)?)
            .await
    }
}

#[async_trait]
impl PlanetScaleApi for Client {
    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<Database, ApiError> {
        self.post(&["organizations", request.organization.as_str(), "databases"], request)
            .await
    }

    async fn get_database(&self, organization: &str, database: &str) -> Result<Database, ApiError> {
        self.get(&["organizations", organization, "databases", database])
            .await
    }

    async fn list_databases(&self, organization: &str) -> Result<Vec<Database>, ApiError> {
        self.list(&["organizations", organization, "databases"]).await
    }

    async fn delete_database(&self, organization: &str, database: &str) -> Result<(), ApiError> {
        self.delete(&["organizations", organization, "databases", database])
            .await
    }

    async fn create_branch(
        &self,
        request: &CreateDatabaseBranchRequest,
    ) -> Result<DatabaseBranch, ApiError> {
        self.post(
            &[
                "organizations",
                request.organization.as_str(),
                "databases",
                request.database.as_str(),
                "branches",
            ],
            request,
        )
        .await
    }

    async fn get_branch(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<DatabaseBranch, ApiError> {
        self.get(&["organizations", organization, "databases", database, "branches", branch])
            .await
    }

    async fn list_branches(
        &self,
        organization: &str,
        database: &str,
    ) -> Result<Vec<DatabaseBranch>, ApiError> {
        self.list(&["organizations", organization, "databases", database, "branches"])
            .await
    }

    async fn delete_branch(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<(), ApiError> {
        self.delete(&["organizations", organization, "databases", database, "branches", branch])
            .await
    }

    async fn create_password(
        &self,
        request: &CreatePasswordRequest,
    ) -> Result<DatabaseBranchPassword, ApiError> {
        self.post(
            &[
                "organizations",
                request.organization.as_str(),
                "databases",
                request.database.as_str(),
                "branches",
                request.branch.as_str(),
                "passwords",
            ],
            request,
        )
        .await
    }

    async fn get_password(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        password_id: &str,
    ) -> Result<DatabaseBranchPassword, ApiError> {
        self.get(&[
            "organizations",
            organization,
            "databases",
            database,
            "branches",
            branch,
            "passwords",
            password_id,
        ])
        .await
    }

    async fn list_passwords(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Vec<DatabaseBranchPassword>, ApiError> {
        self.list(&[
            "organizations",
            organization,
            "databases",
            database,
            "branches",
            branch,
            "passwords",
        ])
        .await
    }

    async fn delete_password(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        password_id: &str,
    ) -> Result<(), ApiError> {
        self.delete(&[
            "organizations",
            organization,
            "databases",
            database,
            "branches",
            branch,
            "passwords",
            password_id,
        ])
        .await
    }

    async fn create_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Backup, ApiError> {
        self.post(
            &[
                "organizations",
                organization,
                "databases",
                database,
                "branches",
                branch,
                "backups",
            ],
            &json!({}),
        )
        .await
    }

    async fn get_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        backup_id: &str,
    ) -> Result<Backup, ApiError> {
        self.get(&[
            "organizations",
            organization,
            "databases",
            database,
            "branches",
            branch,
            "backups",
            backup_id,
        ])
        .await
    }

    async fn list_backups(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
    ) -> Result<Vec<Backup>, ApiError> {
        self.list(&[
            "organizations",
            organization,
            "databases",
            database,
            "branches",
            branch,
            "backups",
        ])
        .await
    }

    async fn delete_backup(
        &self,
        organization: &str,
        database: &str,
        branch: &str,
        backup_id: &str,
    ) -> Result<(), ApiError> {
        self.delete(&[
            "organizations",
            organization,
            "databases",
            database,
            "branches",
            branch,
            "backups",
            backup_id,
        ])
        .await
    }

    async fn create_deploy_request(
        &self,
        request: &CreateDeployRequestRequest,
    ) -> Result<DeployRequest, ApiError> {
        self.post(
            &[
                "organizations",
                request.organization.as_str(),
                "databases",
                request.database.as_str(),
                "deploy-requests",
            ],
            request,
        )
        .await
    }

    async fn get_deploy_request(
        &self,
        organization: &str,
        database: &str,
        number: u64,
    ) -> Result<DeployRequest, ApiError> {
        let number = number.to_string();
        self.get(&["organizations", organization, "databases", database, "deploy-requests", number.as_str()])
            .await
    }

    async fn close_deploy_request(
        &self,
        organization: &str,
        database: &str,
        number: u64,
    ) -> Result<DeployRequest, ApiError> {
        let number = number.to_string();
        let request = self
            .request(
                Method::PATCH,
                &["organizations", organization, "databases", database, "deploy-requests", number.as_str()],
            )?
            .json(&json!({"state": "closed"}));
        self.send(request).await
    }

    async fn list_regions(&self, organization: &str) -> Result<Vec<Region>, ApiError> {
        self.list(&["organizations", organization, "regions"]).await
    }
}
