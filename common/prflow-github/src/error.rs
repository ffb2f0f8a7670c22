//! Error types for GitHub API calls and the workflow steps built on them
//!
//! [`ApiError`] describes a single failed round trip. The per-step errors
//! ([`BranchError`], [`CommitError`], [`PrError`]) split out the outcomes a
//! caller is expected to handle, such as a branch that already exists, from
//! generic API failures.

use serde_json::Value;
use std::fmt;

/// Failure of a single GitHub API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    Status { status: u16, body: String },
    /// A 2xx response whose body could not be decoded
    Decode { message: String, body: String },
    /// No response was received (connect failure, transport deadline, ...)
    Transport(String),
    /// The request URL could not be built from the API base and path
    InvalidUrl(String),
    /// The call was abandoned because cancellation was requested
    Cancelled,
}

impl ApiError {
    /// HTTP status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, if the server answered
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } | ApiError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The `message` field of a GitHub JSON error body
    pub fn message(&self) -> Option<String> {
        let body: Value = serde_json::from_str(self.body()?).ok()?;
        body.get("message")?.as_str().map(str::to_string)
    }

    /// Every human-readable message in the error body
    ///
    /// GitHub reports validation failures as a generic top-level `message`
    /// ("Validation Failed") with the specific reasons under `errors[].message`.
    /// Bodies that are not JSON are returned as a single raw message.
    pub fn detail_messages(&self) -> Vec<String> {
        let Some(raw) = self.body() else {
            return Vec::new();
        };

        let Ok(body) = serde_json::from_str::<Value>(raw) else {
            return if raw.trim().is_empty() {
                Vec::new()
            } else {
                vec![raw.to_string()]
            };
        };

        let mut messages = Vec::new();
        if let Some(message) = body.get("message").and_then(Value::as_str) {
            messages.push(message.to_string());
        }
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            for error in errors {
                match error {
                    Value::String(message) => messages.push(message.clone()),
                    other => {
                        if let Some(message) = other.get("message").and_then(Value::as_str) {
                            messages.push(message.to_string());
                        }
                    }
                }
            }
        }
        messages
    }

    /// Case-insensitive search for `needle` in the error's messages
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.detail_messages()
            .iter()
            .any(|message| message.to_lowercase().contains(&needle))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Status { status, body } => {
                write!(f, "GitHub API error ({}): {}", status, body)
            }
            ApiError::Decode { message, .. } => {
                write!(f, "Failed to parse GitHub API response: {}", message)
            }
            ApiError::Transport(reason) => write!(f, "Request to GitHub failed: {}", reason),
            ApiError::InvalidUrl(reason) => write!(f, "Invalid GitHub API URL: {}", reason),
            ApiError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Failure of [`GitHubClient::create_branch`](crate::GitHubClient::create_branch)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchError {
    /// The branch to fork from does not exist
    SourceNotFound { branch: String },
    /// The new branch already exists; callers may reuse it
    AlreadyExists { branch: String },
    Cancelled,
    Other(ApiError),
}

impl BranchError {
    /// Whether this is an expected state the caller can continue from
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BranchError::AlreadyExists { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BranchError::Cancelled)
    }
}

impl From<ApiError> for BranchError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Cancelled => BranchError::Cancelled,
            other => BranchError::Other(other),
        }
    }
}

impl fmt::Display for BranchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchError::SourceNotFound { branch } => {
                write!(f, "Source branch '{}' not found", branch)
            }
            BranchError::AlreadyExists { branch } => {
                write!(f, "Branch '{}' already exists", branch)
            }
            BranchError::Cancelled => write!(f, "Branch creation cancelled"),
            BranchError::Other(error) => write!(f, "Failed to create branch: {}", error),
        }
    }
}

impl std::error::Error for BranchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BranchError::Other(error) => Some(error),
            _ => None,
        }
    }
}

/// Failure of [`GitHubClient::commit_file`](crate::GitHubClient::commit_file)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// The target branch does not exist; it is never created implicitly
    BranchNotFound { branch: String },
    /// The path is empty or contains an empty segment such as `a//b.txt`
    InvalidPath { path: String },
    /// The path already exists and the current blob sha was missing or stale
    Conflict { path: String },
    Cancelled,
    Other(ApiError),
}

impl CommitError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CommitError::Conflict { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CommitError::Cancelled)
    }
}

impl From<ApiError> for CommitError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Cancelled => CommitError::Cancelled,
            other => CommitError::Other(other),
        }
    }
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::BranchNotFound { branch } => write!(f, "Branch '{}' not found", branch),
            CommitError::InvalidPath { path } => {
                write!(f, "Invalid file path '{}': empty path segment", path)
            }
            CommitError::Conflict { path } => write!(
                f,
                "'{}' already exists on the branch and needs its current sha to be updated",
                path
            ),
            CommitError::Cancelled => write!(f, "Commit cancelled"),
            CommitError::Other(error) => write!(f, "Failed to commit file: {}", error),
        }
    }
}

impl std::error::Error for CommitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommitError::Other(error) => Some(error),
            _ => None,
        }
    }
}

/// Failure of [`GitHubClient::open_pull_request`](crate::GitHubClient::open_pull_request)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrError {
    /// An open pull request for the same head and base already exists
    AlreadyOpen { head: String, base: String },
    /// Head and base point at the same content
    NothingToCompare { head: String, base: String },
    Cancelled,
    Other(ApiError),
}

impl PrError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PrError::AlreadyOpen { .. } | PrError::NothingToCompare { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PrError::Cancelled)
    }
}

impl From<ApiError> for PrError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Cancelled => PrError::Cancelled,
            other => PrError::Other(other),
        }
    }
}

impl fmt::Display for PrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrError::AlreadyOpen { head, base } => write!(
                f,
                "A pull request from '{}' into '{}' is already open",
                head, base
            ),
            PrError::NothingToCompare { head, base } => {
                write!(f, "No commits between '{}' and '{}'", base, head)
            }
            PrError::Cancelled => write!(f, "Pull request creation cancelled"),
            PrError::Other(error) => write!(f, "Failed to create pull request: {}", error),
        }
    }
}

impl std::error::Error for PrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrError::Other(error) => Some(error),
            _ => None,
        }
    }
}

/// Invalid repository selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// There is nothing to select from
    Empty,
    /// The input was not a non-negative integer
    NotANumber(String),
    OutOfRange { index: usize, len: usize },
    NotFound(String),
    /// A bare name shared by repositories of different owners
    Ambiguous { name: String, candidates: Vec<String> },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::Empty => write!(f, "No repositories to select from"),
            SelectionError::NotANumber(input) => {
                write!(f, "Invalid selection '{}': expected an index", input)
            }
            SelectionError::OutOfRange { index, len } => write!(
                f,
                "Invalid selection {}: choose an index between 0 and {}",
                index,
                len.saturating_sub(1)
            ),
            SelectionError::NotFound(name) => {
                write!(f, "Repository '{}' not found in your repositories", name)
            }
            SelectionError::Ambiguous { name, candidates } => write!(
                f,
                "Repository name '{}' is ambiguous; use one of: {}",
                name,
                candidates.join(", ")
            ),
        }
    }
}

impl std::error::Error for SelectionError {}
