//! Single-file commits through the repository contents API

use crate::client::{Endpoint, GitHubClient, decode};
use crate::error::{ApiError, CommitError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// One file to commit onto an existing branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommit {
    pub path: String,
    pub content: Vec<u8>,
    pub message: String,
    pub branch: String,
    /// Blob sha of the file being replaced; required by GitHub for updates
    pub sha: Option<String>,
}

impl FileCommit {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
        message: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            message: message.into(),
            branch: branch.into(),
            sha: None,
        }
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    pub fn encoded_content(&self) -> String {
        encode_content(&self.content)
    }
}

/// Standard base64 of arbitrary bytes, as the contents API expects
pub fn encode_content(content: &[u8]) -> String {
    STANDARD.encode(content)
}

/// Decode base64 content, ignoring the line breaks GitHub inserts
pub fn decode_content(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact)
}

#[derive(Debug, Serialize)]
struct UpdateContentPayload<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    sha: String,
}

/// True for an empty path, `a//b` and paths with a leading or trailing `/`
fn has_empty_segment(path: &str) -> bool {
    path.split('/').any(str::is_empty)
}

fn branch_missing(error: &ApiError) -> bool {
    matches!(error.status(), Some(404) | Some(422))
        && error.detail_messages().iter().any(|message| {
            let message = message.to_lowercase();
            (message.contains("branch") && message.contains("not found"))
                || message.contains("no commit found for the ref")
        })
}

fn is_conflict(error: &ApiError) -> bool {
    match error.status() {
        Some(409) => true,
        Some(422) => error.mentions("sha"),
        _ => false,
    }
}

fn classify(error: ApiError, commit: &FileCommit) -> CommitError {
    if branch_missing(&error) {
        CommitError::BranchNotFound {
            branch: commit.branch.clone(),
        }
    } else if is_conflict(&error) {
        CommitError::Conflict {
            path: commit.path.clone(),
        }
    } else {
        error.into()
    }
}

impl GitHubClient {
    /// Current blob sha of `path` on `branch`; `None` if the file does not exist
    #[instrument(skip(self))]
    pub async fn file_sha(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<Option<String>, ApiError> {
        let endpoint = Endpoint::repo(owner, repo)
            .segment("contents")
            .segments(path)
            .query("ref", branch);

        match self.get(endpoint).await {
            Ok(value) => {
                let entry: ContentEntry = decode(value)?;
                Ok(Some(entry.sha))
            }
            Err(error) if error.status() == Some(404) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Commit one file to an existing branch
    ///
    /// The branch is never created here. A missing branch is always reported
    /// as [`CommitError::BranchNotFound`], even when the path also exists.
    #[instrument(skip(self, commit), fields(path = %commit.path, branch = %commit.branch))]
    pub async fn commit_file(
        &self,
        owner: &str,
        repo: &str,
        commit: &FileCommit,
    ) -> Result<(), CommitError> {
        if has_empty_segment(&commit.path) {
            return Err(CommitError::InvalidPath {
                path: commit.path.clone(),
            });
        }

        let payload = UpdateContentPayload {
            message: &commit.message,
            content: commit.encoded_content(),
            branch: &commit.branch,
            sha: commit.sha.as_deref(),
        };
        let endpoint = Endpoint::repo(owner, repo)
            .segment("contents")
            .segments(&commit.path);

        self.send_json(Method::PUT, endpoint, &payload)
            .await
            .map(|_| ())
            .map_err(|error| classify(error, commit))
    }
}
