//! GitHub API client library
//!
//! This library wraps the handful of GitHub REST endpoints needed to publish
//! one file as a pull request: list the user's repositories, branch off a
//! source branch, commit a file and open the pull request.
//!
//! ## Modules
//!
//! - [`client`]: Authenticated client, endpoint paths and request plumbing
//! - [`transport`]: The HTTP seam and its `reqwest` implementation
//! - [`auth`]: Token credentials
//! - [`cancel`]: Cancellation handles shared with in-flight requests
//! - [`error`]: Error types for every operation
//! - [`repositories`]: Repository listing
//! - [`selection`]: Choosing one repository from a listing
//! - [`branches`]: Branch lookup and creation
//! - [`contents`]: Single-file commits
//! - [`pull_requests`]: Pull request creation and lookup
//! - [`workflow`]: The branch → commit → pull request sequence

pub mod auth;
pub mod branches;
pub mod cancel;
pub mod client;
pub mod contents;
pub mod error;
pub mod pull_requests;
pub mod repositories;
pub mod selection;
pub mod transport;
pub mod workflow;

// Re-export public API
pub use auth::Credentials;
pub use branches::{BranchRef, DEFAULT_SOURCE_BRANCH};
pub use cancel::{CancelHandle, CancelToken, cancellation};
pub use client::{ClientOptions, Endpoint, GitHubClient};
pub use contents::{FileCommit, decode_content, encode_content};
pub use error::{ApiError, BranchError, CommitError, PrError, SelectionError};
pub use pull_requests::{PullRequestRequest, PullRequestResult};
pub use repositories::RepositorySummary;
pub use selection::{find_repository, parse_selection, select_repository};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, Transport};
pub use workflow::{PublishOutcome, PublishPlan, Workflow, WorkflowError, WorkflowState};
pub use reqwest::Method;
