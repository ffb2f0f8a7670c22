//! Publish command implementation
//!
//! Picks one of the account's repositories, then creates a branch, commits a
//! single file to it and opens a pull request back into the base branch.

use super::ls::write_listing;
use super::{Command, CommandContext};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use colored::*;
use prflow_github::error::{BranchError, CommitError, PrError};
use prflow_github::{
    CancelToken, GitHubClient, PublishOutcome, PublishPlan, RepositorySummary, Workflow,
    WorkflowError, find_repository, parse_selection, select_repository,
};
use std::io::{self, BufRead, BufReader, Write};
use tracing::{debug, info};

/// Longest inline content quoted in the default pull request body
const QUOTED_CONTENT_LIMIT: usize = 60;

/// How the target repository is picked from the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryChoice {
    /// Print the listing and read an index from stdin
    Prompt,
    Index(usize),
    Name(String),
}

/// Publish command for committing one file and opening a pull request
#[derive(Debug, Clone)]
pub struct PublishCommand {
    pub repository: RepositoryChoice,
    pub branch: String,
    pub base: String,
    pub path: String,
    pub content: Vec<u8>,
    pub message: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub draft: bool,
    /// Continue on an existing branch and report an already-open pull request
    pub resume: bool,
    pub update_existing: bool,
}

impl PublishCommand {
    /// Body used when none is given, e.g. `This PR adds Hello.txt with 'Hello world'.`
    pub fn default_body(&self) -> String {
        match std::str::from_utf8(&self.content) {
            Ok(text)
                if !text.is_empty()
                    && text.len() <= QUOTED_CONTENT_LIMIT
                    && !text.contains('\n') =>
            {
                format!("This PR adds {} with '{}'.", self.path, text)
            }
            _ => format!("This PR adds {}.", self.path),
        }
    }

    /// Build the workflow plan for `owner/repo`
    pub fn plan(&self, owner: &str, repo: &str) -> PublishPlan {
        let mut plan = PublishPlan::new(
            owner,
            repo,
            self.branch.clone(),
            self.path.clone(),
            self.content.clone(),
        )
        .with_source_branch(self.base.clone())
        .with_body(self.body.clone().unwrap_or_else(|| self.default_body()));

        if let Some(message) = &self.message {
            plan = plan.with_commit_message(message.clone());
        }
        // The title follows the commit message unless given explicitly
        let title = self
            .title
            .clone()
            .unwrap_or_else(|| plan.commit_message.clone());
        plan = plan.with_title(title);

        if self.draft {
            plan = plan.as_draft();
        }
        if self.resume {
            plan = plan.resumable();
        }
        if self.update_existing {
            plan = plan.update_existing_file();
        }
        plan
    }

    /// Resolve the target repository, prompting on `input` when required
    ///
    /// The prompt is read on a blocking thread and abandoned once `cancel`
    /// fires.
    pub async fn resolve_repository<R, W>(
        &self,
        repositories: &[RepositorySummary],
        input: R,
        output: &mut W,
        cancel: Option<&CancelToken>,
    ) -> Result<RepositorySummary>
    where
        R: BufRead + Send + 'static,
        W: Write + Send,
    {
        match &self.repository {
            RepositoryChoice::Index(index) => Ok(select_repository(repositories, *index)?),
            RepositoryChoice::Name(name) => Ok(find_repository(repositories, name)?.clone()),
            RepositoryChoice::Prompt => {
                if repositories.is_empty() {
                    return Err(prflow_github::SelectionError::Empty.into());
                }

                write_listing(repositories, output)?;
                write!(output, "Select a repository by number: ")?;
                output.flush()?;

                let line = read_selection(input, cancel).await?;
                let index = parse_selection(&line, repositories.len())?;
                Ok(select_repository(repositories, index)?)
            }
        }
    }

    /// Run the branch, commit and pull request steps, reporting progress
    pub async fn publish(&self, client: &GitHubClient, plan: &PublishPlan) -> Result<PublishOutcome> {
        let mut workflow = Workflow::new(client);

        println!(
            "{} | Creating branch '{}' from '{}'",
            plan.repo.cyan().bold(),
            plan.branch,
            plan.source_branch
        );
        let step = workflow.create_branch(plan).await.map(|_| ());
        step.map_err(|error| explain(error, &workflow))?;

        println!("{} | Committing {}", plan.repo.cyan().bold(), plan.path);
        let step = workflow.commit_file(plan).await.map(|_| ());
        step.map_err(|error| explain(error, &workflow))?;

        println!("{} | Opening pull request", plan.repo.cyan().bold());
        let step = workflow.open_pull_request(plan).await.map(|_| ());
        step.map_err(|error| explain(error, &workflow))?;

        workflow
            .outcome()
            .ok_or_else(|| anyhow!("Workflow stopped at state '{}'", workflow.state()))
    }
}

/// Read one line from `input`, giving up once `cancel` fires
async fn read_selection<R>(mut input: R, cancel: Option<&CancelToken>) -> Result<String>
where
    R: BufRead + Send + 'static,
{
    let read = tokio::task::spawn_blocking(move || {
        let mut line = String::new();
        input.read_line(&mut line).map(|_| line)
    });

    let joined = match cancel {
        Some(cancel) => tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(anyhow!("Cancelled while waiting for a repository selection"));
            }
            joined = read => joined,
        },
        None => read.await,
    };

    let line = joined
        .context("Selection reader stopped")?
        .context("Failed to read selection")?;
    Ok(line)
}

/// Turn a step failure into a message that says how far the run got
fn explain(error: WorkflowError, workflow: &Workflow<'_>) -> anyhow::Error {
    let reached = workflow.state();
    if error.is_cancelled() {
        return anyhow!("Cancelled; workflow stopped at state '{}'", reached);
    }

    let hint = match &error {
        WorkflowError::Branch(BranchError::AlreadyExists { .. })
        | WorkflowError::PullRequest(PrError::AlreadyOpen { .. }) => {
            Some("re-run with --resume to continue from what already exists")
        }
        WorkflowError::Commit(CommitError::Conflict { .. }) => {
            Some("re-run with --update-existing to replace the file")
        }
        _ => None,
    };

    match hint {
        Some(hint) => anyhow!("{} (workflow state '{}'; {})", error, reached, hint),
        None => anyhow!("{} (workflow state '{}')", error, reached),
    }
}

#[async_trait]
impl Command for PublishCommand {
    async fn execute(&self, context: &CommandContext) -> Result<()> {
        let repositories = context
            .client
            .list_repositories()
            .await
            .context("Failed to list repositories")?;

        let repository = self
            .resolve_repository(
                &repositories,
                BufReader::new(io::stdin()),
                &mut io::stdout(),
                context.client.cancel_token(),
            )
            .await?;

        let owner = repository
            .owner_login()
            .unwrap_or_else(|| context.client.account())
            .to_string();
        let plan = self.plan(&owner, &repository.name);
        info!(
            owner = %plan.owner,
            repo = %plan.repo,
            branch = %plan.branch,
            path = %plan.path,
            "publishing file"
        );

        let outcome = self.publish(&context.client, &plan).await?;
        debug!(
            reused_branch = outcome.reused_branch,
            reused_pull_request = outcome.reused_pull_request,
            "publish finished"
        );

        if outcome.reused_branch {
            println!("{}", format!("Reused existing branch '{}'", outcome.branch.name).yellow());
        }
        if outcome.reused_pull_request {
            println!("{}", "Pull request was already open".yellow());
        }
        println!(
            "{} {}",
            "Pull request:".green(),
            outcome.pull_request.url.bold()
        );

        Ok(())
    }
}
