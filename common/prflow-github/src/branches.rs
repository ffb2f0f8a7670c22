//! Branch creation through the Git refs API

use crate::client::{Endpoint, GitHubClient, decode};
use crate::error::{ApiError, BranchError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Branch new branches are created from unless told otherwise
pub const DEFAULT_SOURCE_BRANCH: &str = "main";

/// A branch and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    pub name: String,
    pub commit_sha: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Serialize)]
struct CreateRefPayload<'a> {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: &'a str,
}

/// 409 on a ref lookup means the repository has no commits at all
fn is_missing(error: &ApiError) -> bool {
    matches!(error.status(), Some(404) | Some(409))
}

fn ref_already_exists(error: &ApiError) -> bool {
    match error.status() {
        Some(409) => true,
        Some(422) => error.mentions("already exists"),
        _ => false,
    }
}

impl GitHubClient {
    /// Resolve a branch to the commit it points at; `None` if it does not exist
    #[instrument(skip(self))]
    pub async fn branch_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Option<BranchRef>, ApiError> {
        let endpoint = Endpoint::repo(owner, repo)
            .segments("git/ref/heads")
            .segments(branch);

        match self.get(endpoint).await {
            Ok(value) => {
                let git_ref: GitRef = decode(value)?;
                Ok(Some(BranchRef {
                    name: branch.to_string(),
                    commit_sha: git_ref.object.sha,
                }))
            }
            Err(error) if is_missing(&error) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Create `new_branch` pointing at the current head of `source_branch`
    ///
    /// Fails with [`BranchError::AlreadyExists`] when the branch is already
    /// there, which makes re-running after a partial success safe. Nothing is
    /// retried.
    #[instrument(skip(self))]
    pub async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        source_branch: &str,
        new_branch: &str,
    ) -> Result<BranchRef, BranchError> {
        let source = self
            .branch_ref(owner, repo, source_branch)
            .await?
            .ok_or_else(|| BranchError::SourceNotFound {
                branch: source_branch.to_string(),
            })?;

        debug!(sha = %source.commit_sha, "resolved source branch");

        let payload = CreateRefPayload {
            ref_name: format!("refs/heads/{}", new_branch),
            sha: &source.commit_sha,
        };

        match self
            .send_json(Method::POST, Endpoint::repo(owner, repo).segments("git/refs"), &payload)
            .await
        {
            Ok(_) => Ok(BranchRef {
                name: new_branch.to_string(),
                commit_sha: source.commit_sha,
            }),
            Err(error) if ref_already_exists(&error) => Err(BranchError::AlreadyExists {
                branch: new_branch.to_string(),
            }),
            Err(error) => Err(error.into()),
        }
    }
}
