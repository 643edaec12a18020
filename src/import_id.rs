//! Parsing of composite import identifiers such as `acme/mydb/main`.

use std::fmt;
use std::str::FromStr;

use crate::error::ProviderError;

/// Split `id` on `/` and return the parts only when there are exactly `arity`.
///
/// Empty parts are kept; `"a//c"` has arity 3.
pub fn split_import_id(id: &str, arity: usize) -> Option<Vec<&str>> {
    let parts: Vec<&str> = id.split('/').collect();
    (parts.len() == arity).then_some(parts)
}

fn invalid(id: &str, format: &str) -> ProviderError {
    ProviderError::InvalidRequest(format!(
        "unexpected import identifier \"{id}\": expected {format}"
    ))
}

/// Import identifier of a database: `organization/database`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseImportId {
    pub organization: String,
    pub database: String,
}

impl DatabaseImportId {
    pub const FORMAT: &'static str = "organization/database";
}

impl FromStr for DatabaseImportId {
    type Err = ProviderError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        match split_import_id(id, 2).as_deref() {
            Some([organization, database]) => Ok(Self {
                organization: organization.to_string(),
                database: database.to_string(),
            }),
            _ => Err(invalid(id, Self::FORMAT)),
        }
    }
}

impl fmt::Display for DatabaseImportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.database)
    }
}

/// Import identifier of a branch: `organization/database/branch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchImportId {
    pub organization: String,
    pub database: String,
    pub branch: String,
}

impl BranchImportId {
    pub const FORMAT: &'static str = "organization/database/branch";
}

impl FromStr for BranchImportId {
    type Err = ProviderError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        match split_import_id(id, 3).as_deref() {
            Some([organization, database, branch]) => Ok(Self {
                organization: organization.to_string(),
                database: database.to_string(),
                branch: branch.to_string(),
            }),
            _ => Err(invalid(id, Self::FORMAT)),
        }
    }
}

impl fmt::Display for BranchImportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.organization, self.database, self.branch)
    }
}
