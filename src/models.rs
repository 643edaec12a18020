//! Request and response bodies of the PlanetScale v1 API.
//!
//! Only the fields the provider maps into state are modelled; everything else
//! in the API responses is ignored on decode.

use serde::{Deserialize, Serialize};

/// A PlanetScale region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    /// Region slug, e.g. `us-east`.
    pub slug: String,
    /// Display name, e.g. `AWS us-east-1`.
    #[serde(rename = "display_name")]
    pub name: String,
    /// Physical location, e.g. `Ashburn, Virginia`.
    pub location: String,
    /// Whether the region is enabled for the organization.
    pub enabled: bool,
}

/// A database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub name: String,
    pub notes: String,
    pub region: Region,
    pub html_url: String,
    /// One of `pending`, `importing`, `ready`, ...
    pub state: String,
}

/// A database branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseBranch {
    pub name: String,
    pub parent_branch: String,
    pub region: Region,
    pub production: bool,
    pub ready: bool,
    pub html_url: String,
    pub access_host_url: String,
}

/// A database branch password. `plain_text` is only returned on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseBranchPassword {
    #[serde(rename = "id")]
    pub public_id: String,
    pub name: String,
    pub username: String,
    #[serde(rename = "access_host_url")]
    pub hostname: String,
    pub role: String,
    #[serde(rename = "plain_text")]
    pub plaintext: String,
}

/// A branch backup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Backup {
    #[serde(rename = "id")]
    pub public_id: String,
    pub name: String,
    pub state: String,
    pub size: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub started_at: Option<String>,
    pub expires_at: Option<String>,
    pub completed_at: Option<String>,
}

/// A deploy request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployRequest {
    pub id: String,
    pub number: u64,
    pub branch: String,
    pub into_branch: String,
    pub notes: String,
    pub state: String,
    pub deployment_state: String,
    pub approved: bool,
    pub html_url: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Body of `POST /organizations/{org}/databases`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateDatabaseRequest {
    #[serde(skip)]
    pub organization: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Body of `POST .../databases/{db}/branches`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateDatabaseBranchRequest {
    #[serde(skip)]
    pub organization: String,
    #[serde(skip)]
    pub database: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_data: Option<String>,
}

/// Body of `POST .../branches/{branch}/passwords`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatePasswordRequest {
    #[serde(skip)]
    pub organization: String,
    #[serde(skip)]
    pub database: String,
    #[serde(skip)]
    pub branch: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Body of `POST .../databases/{db}/deploy-requests`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateDeployRequestRequest {
    #[serde(skip)]
    pub organization: String,
    #[serde(skip)]
    pub database: String,
    pub branch: String,
    pub into_branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Envelope of every list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}
