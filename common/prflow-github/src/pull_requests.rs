//! Pull request operations

use crate::client::{Endpoint, GitHubClient, decode};
use crate::error::{ApiError, PrError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Parameters for creating a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRequest {
    pub title: String,
    pub body: String,
    /// Branch containing the changes
    pub head: String,
    /// Branch the changes should be merged into
    pub base: String,
    pub draft: bool,
}

impl PullRequestRequest {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        head: impl Into<String>,
        base: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            head: head.into(),
            base: base.into(),
            draft: false,
        }
    }

    pub fn as_draft(mut self) -> Self {
        self.draft = true;
        self
    }
}

/// The pull request that was opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestResult {
    #[serde(rename = "html_url")]
    pub url: String,
    #[serde(default)]
    pub number: Option<u64>,
}

#[derive(Serialize)]
struct CreatePullRequestPayload<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    draft: Option<bool>,
}

fn classify(error: ApiError, request: &PullRequestRequest) -> PrError {
    if error.status() == Some(422) {
        if error.mentions("pull request already exists") {
            return PrError::AlreadyOpen {
                head: request.head.clone(),
                base: request.base.clone(),
            };
        }
        if error.mentions("no commits between") {
            return PrError::NothingToCompare {
                head: request.head.clone(),
                base: request.base.clone(),
            };
        }
    }
    error.into()
}

impl GitHubClient {
    /// Open a pull request from `request.head` into `request.base`
    ///
    /// An already-open pull request for the same pair and an empty diff are
    /// reported as [`PrError::AlreadyOpen`] and [`PrError::NothingToCompare`].
    #[instrument(skip(self, request), fields(head = %request.head, base = %request.base))]
    pub async fn open_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: &PullRequestRequest,
    ) -> Result<PullRequestResult, PrError> {
        let payload = CreatePullRequestPayload {
            title: &request.title,
            body: &request.body,
            head: &request.head,
            base: &request.base,
            draft: if request.draft { Some(true) } else { None },
        };

        let value = self
            .send_json(
                Method::POST,
                Endpoint::repo(owner, repo).segment("pulls"),
                &payload,
            )
            .await
            .map_err(|error| classify(error, request))?;

        Ok(decode(value)?)
    }

    /// The open pull request from `head` into `base`, if there is one
    ///
    /// `head` is a branch of `owner/repo`.
    #[instrument(skip(self))]
    pub async fn find_open_pull_request(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequestResult>, ApiError> {
        let endpoint = Endpoint::repo(owner, repo)
            .segment("pulls")
            .query("state", "open")
            .query("head", &format!("{}:{}", owner, head))
            .query("base", base);

        let pulls: Vec<PullRequestResult> = decode(self.get(endpoint).await?)?;
        Ok(pulls.into_iter().next())
    }
}
