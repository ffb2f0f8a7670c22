//! Repository listing

use crate::client::{Endpoint, GitHubClient, decode};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

/// Repositories requested per listing call
pub const LIST_PAGE_SIZE: &str = "100";

/// A repository as returned by the "list my repositories" endpoint
///
/// Only `name` is interpreted; every other field is kept verbatim in
/// `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl RepositorySummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn full_name(&self) -> Option<&str> {
        self.metadata.get("full_name")?.as_str()
    }

    /// Login of the owning user or organization
    pub fn owner_login(&self) -> Option<&str> {
        self.metadata.get("owner")?.get("login")?.as_str()
    }

    pub fn is_private(&self) -> Option<bool> {
        self.metadata.get("private")?.as_bool()
    }

    pub fn default_branch(&self) -> Option<&str> {
        self.metadata.get("default_branch")?.as_str()
    }

    pub fn html_url(&self) -> Option<&str> {
        self.metadata.get("html_url")?.as_str()
    }
}

impl GitHubClient {
    /// List repositories of the authenticated user
    ///
    /// Issues a single GET, most recently pushed first. The server's order is
    /// kept as is; an account without repositories yields an empty list.
    #[instrument(skip(self))]
    pub async fn list_repositories(&self) -> Result<Vec<RepositorySummary>, ApiError> {
        let endpoint = Endpoint::new("user/repos")
            .query("per_page", LIST_PAGE_SIZE)
            .query("sort", "pushed");
        let value = self.get(endpoint).await?;
        decode(value)
    }
}
