//! List command implementation

use super::{Command, CommandContext};
use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::*;
use prflow_github::RepositorySummary;
use serde::Serialize;
use std::io::{self, Write};
use tracing::debug;

/// Output format for a repository in JSON mode
#[derive(Debug, Serialize)]
struct RepositoryOutput<'a> {
    index: usize,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

/// List command for displaying the account's repositories with their index
pub struct ListCommand {
    /// Output in JSON format
    pub json: bool,
}

/// Print one numbered line per repository
///
/// The numbers are the indices accepted by `publish --index` and the
/// interactive prompt.
pub fn write_listing<W: Write>(repositories: &[RepositorySummary], out: &mut W) -> io::Result<()> {
    for (index, repo) in repositories.iter().enumerate() {
        let visibility = match repo.is_private() {
            Some(true) => " (private)".dimmed().to_string(),
            _ => String::new(),
        };
        writeln!(
            out,
            "{} {}{}",
            format!("[{}]", index).blue(),
            repo.name.bold(),
            visibility
        )?;
    }
    Ok(())
}

/// Render the listing as pretty JSON
pub fn listing_json(repositories: &[RepositorySummary]) -> Result<String> {
    let output: Vec<RepositoryOutput> = repositories
        .iter()
        .enumerate()
        .map(|(index, repo)| RepositoryOutput {
            index,
            name: &repo.name,
            full_name: repo.full_name(),
            private: repo.is_private(),
            default_branch: repo.default_branch(),
            url: repo.html_url(),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&output)?)
}

#[async_trait]
impl Command for ListCommand {
    async fn execute(&self, context: &CommandContext) -> Result<()> {
        let repositories = context
            .client
            .list_repositories()
            .await
            .context("Failed to list repositories")?;
        debug!(count = repositories.len(), json = self.json, "listing repositories");

        if self.json {
            println!("{}", listing_json(&repositories)?);
            return Ok(());
        }

        if repositories.is_empty() {
            println!(
                "{}",
                format!("No repositories found for {}", context.client.account()).yellow()
            );
            return Ok(());
        }

        println!(
            "{}",
            format!("Found {} repositories", repositories.len()).green()
        );
        println!();

        let stdout = io::stdout();
        write_listing(&repositories, &mut stdout.lock())?;

        Ok(())
    }
}
