//! Branch → commit → pull request workflow
//!
//! A [`Workflow`] walks `Idle → BranchCreated → FileCommitted → PrOpened`
//! and never moves backwards. A failed step leaves the state where it was;
//! whatever earlier steps created on GitHub stays there, and the caller can
//! resume by running the same [`PublishPlan`] again with the reuse options
//! enabled.

use crate::branches::{BranchRef, DEFAULT_SOURCE_BRANCH};
use crate::client::GitHubClient;
use crate::contents::FileCommit;
use crate::error::{BranchError, CommitError, PrError};
use crate::pull_requests::{PullRequestRequest, PullRequestResult};
use std::fmt;
use tracing::info;

/// Progress of a [`Workflow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowState {
    Idle,
    BranchCreated,
    FileCommitted,
    PrOpened,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::BranchCreated => "branch created",
            WorkflowState::FileCommitted => "file committed",
            WorkflowState::PrOpened => "pull request opened",
        };
        f.write_str(name)
    }
}

/// Everything one publish cycle needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
    pub owner: String,
    pub repo: String,
    /// Branch to fork from; also the pull request base
    pub source_branch: String,
    pub branch: String,
    pub path: String,
    pub content: Vec<u8>,
    pub commit_message: String,
    pub title: String,
    pub body: String,
    pub draft: bool,
    /// Continue on an existing branch instead of failing with `AlreadyExists`
    pub reuse_existing_branch: bool,
    /// Look up the current blob sha first so an existing file is replaced
    pub update_existing_file: bool,
    /// Report the already-open pull request instead of failing with `AlreadyOpen`
    pub reuse_open_pull_request: bool,
}

impl PublishPlan {
    /// Plan with the commit message and title defaulting to `Add <path>`
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let path = path.into();
        let message = format!("Add {}", path);
        Self {
            owner: owner.into(),
            repo: repo.into(),
            source_branch: DEFAULT_SOURCE_BRANCH.to_string(),
            branch: branch.into(),
            path,
            content: content.into(),
            commit_message: message.clone(),
            title: message,
            body: String::new(),
            draft: false,
            reuse_existing_branch: false,
            update_existing_file: false,
            reuse_open_pull_request: false,
        }
    }

    pub fn with_source_branch(mut self, source_branch: impl Into<String>) -> Self {
        self.source_branch = source_branch.into();
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn as_draft(mut self) -> Self {
        self.draft = true;
        self
    }

    /// Reuse an existing branch and an already-open pull request
    pub fn resumable(mut self) -> Self {
        self.reuse_existing_branch = true;
        self.reuse_open_pull_request = true;
        self
    }

    pub fn update_existing_file(mut self) -> Self {
        self.update_existing_file = true;
        self
    }
}

/// Result of a completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub branch: BranchRef,
    pub pull_request: PullRequestResult,
    pub reused_branch: bool,
    pub reused_pull_request: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// A step was requested before its predecessor completed, or twice
    OutOfOrder {
        expected: WorkflowState,
        actual: WorkflowState,
    },
    Branch(BranchError),
    Commit(CommitError),
    PullRequest(PrError),
}

impl WorkflowError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            WorkflowError::OutOfOrder { .. } => false,
            WorkflowError::Branch(error) => error.is_cancelled(),
            WorkflowError::Commit(error) => error.is_cancelled(),
            WorkflowError::PullRequest(error) => error.is_cancelled(),
        }
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::OutOfOrder { expected, actual } => write!(
                f,
                "Workflow step requires state '{}' but the workflow is '{}'",
                expected, actual
            ),
            WorkflowError::Branch(error) => write!(f, "{}", error),
            WorkflowError::Commit(error) => write!(f, "{}", error),
            WorkflowError::PullRequest(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkflowError::OutOfOrder { .. } => None,
            WorkflowError::Branch(error) => Some(error),
            WorkflowError::Commit(error) => Some(error),
            WorkflowError::PullRequest(error) => Some(error),
        }
    }
}

impl From<BranchError> for WorkflowError {
    fn from(error: BranchError) -> Self {
        WorkflowError::Branch(error)
    }
}

impl From<CommitError> for WorkflowError {
    fn from(error: CommitError) -> Self {
        WorkflowError::Commit(error)
    }
}

impl From<PrError> for WorkflowError {
    fn from(error: PrError) -> Self {
        WorkflowError::PullRequest(error)
    }
}

/// One publish cycle against a single repository
#[derive(Debug)]
pub struct Workflow<'a> {
    client: &'a GitHubClient,
    state: WorkflowState,
    branch: Option<BranchRef>,
    reused_branch: bool,
    pull_request: Option<PullRequestResult>,
    reused_pull_request: bool,
}

impl<'a> Workflow<'a> {
    pub fn new(client: &'a GitHubClient) -> Self {
        Self {
            client,
            state: WorkflowState::Idle,
            branch: None,
            reused_branch: false,
            pull_request: None,
            reused_pull_request: false,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn branch(&self) -> Option<&BranchRef> {
        self.branch.as_ref()
    }

    pub fn pull_request(&self) -> Option<&PullRequestResult> {
        self.pull_request.as_ref()
    }

    fn require(&self, expected: WorkflowState) -> Result<(), WorkflowError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(WorkflowError::OutOfOrder {
                expected,
                actual: self.state,
            })
        }
    }

    /// `Idle → BranchCreated`
    pub async fn create_branch(&mut self, plan: &PublishPlan) -> Result<&BranchRef, WorkflowError> {
        self.require(WorkflowState::Idle)?;

        let result = self
            .client
            .create_branch(&plan.owner, &plan.repo, &plan.source_branch, &plan.branch)
            .await;

        let (branch, reused) = match result {
            Ok(branch) => (branch, false),
            Err(BranchError::AlreadyExists { branch }) if plan.reuse_existing_branch => {
                let existing = self
                    .client
                    .branch_ref(&plan.owner, &plan.repo, &branch)
                    .await
                    .map_err(BranchError::from)?;
                match existing {
                    Some(existing) => (existing, true),
                    None => return Err(BranchError::AlreadyExists { branch }.into()),
                }
            }
            Err(error) => return Err(error.into()),
        };

        info!(branch = %branch.name, sha = %branch.commit_sha, reused, "branch ready");
        self.reused_branch = reused;
        self.state = WorkflowState::BranchCreated;
        Ok(self.branch.insert(branch))
    }

    /// `BranchCreated → FileCommitted`
    pub async fn commit_file(&mut self, plan: &PublishPlan) -> Result<(), WorkflowError> {
        self.require(WorkflowState::BranchCreated)?;
        let branch_name = match &self.branch {
            Some(branch) => branch.name.clone(),
            None => {
                return Err(WorkflowError::OutOfOrder {
                    expected: WorkflowState::BranchCreated,
                    actual: WorkflowState::Idle,
                });
            }
        };

        let mut commit = FileCommit::new(
            plan.path.clone(),
            plan.content.clone(),
            plan.commit_message.clone(),
            branch_name,
        );

        if plan.update_existing_file {
            let current = self
                .client
                .file_sha(&plan.owner, &plan.repo, &commit.branch, &commit.path)
                .await
                .map_err(CommitError::from)?;
            if let Some(sha) = current {
                commit = commit.with_sha(sha);
            }
        }

        self.client
            .commit_file(&plan.owner, &plan.repo, &commit)
            .await?;

        info!(path = %commit.path, branch = %commit.branch, "file committed");
        self.state = WorkflowState::FileCommitted;
        Ok(())
    }

    /// `FileCommitted → PrOpened`
    pub async fn open_pull_request(
        &mut self,
        plan: &PublishPlan,
    ) -> Result<&PullRequestResult, WorkflowError> {
        self.require(WorkflowState::FileCommitted)?;
        let head = match &self.branch {
            Some(branch) => branch.name.clone(),
            None => {
                return Err(WorkflowError::OutOfOrder {
                    expected: WorkflowState::FileCommitted,
                    actual: WorkflowState::Idle,
                });
            }
        };

        let mut request = PullRequestRequest::new(
            plan.title.clone(),
            plan.body.clone(),
            head,
            plan.source_branch.clone(),
        );
        if plan.draft {
            request = request.as_draft();
        }

        let result = self
            .client
            .open_pull_request(&plan.owner, &plan.repo, &request)
            .await;

        let (pull_request, reused) = match result {
            Ok(pull_request) => (pull_request, false),
            Err(PrError::AlreadyOpen { head, base }) if plan.reuse_open_pull_request => {
                let existing = self
                    .client
                    .find_open_pull_request(&plan.owner, &plan.repo, &head, &base)
                    .await
                    .map_err(PrError::from)?;
                match existing {
                    Some(existing) => (existing, true),
                    None => return Err(PrError::AlreadyOpen { head, base }.into()),
                }
            }
            Err(error) => return Err(error.into()),
        };

        info!(url = %pull_request.url, reused, "pull request ready");
        self.reused_pull_request = reused;
        self.state = WorkflowState::PrOpened;
        Ok(self.pull_request.insert(pull_request))
    }

    /// Result of a finished run; `None` until the pull request is open
    pub fn outcome(&self) -> Option<PublishOutcome> {
        match (&self.branch, &self.pull_request) {
            (Some(branch), Some(pull_request)) if self.state == WorkflowState::PrOpened => {
                Some(PublishOutcome {
                    branch: branch.clone(),
                    pull_request: pull_request.clone(),
                    reused_branch: self.reused_branch,
                    reused_pull_request: self.reused_pull_request,
                })
            }
            _ => None,
        }
    }

    /// Run every remaining step in order
    pub async fn run(&mut self, plan: &PublishPlan) -> Result<PublishOutcome, WorkflowError> {
        if self.state == WorkflowState::Idle {
            self.create_branch(plan).await?;
        }
        if self.state == WorkflowState::BranchCreated {
            self.commit_file(plan).await?;
        }
        if self.state == WorkflowState::FileCommitted {
            self.open_pull_request(plan).await?;
        }

        self.outcome().ok_or(WorkflowError::OutOfOrder {
            expected: WorkflowState::PrOpened,
            actual: self.state,
        })
    }
}
