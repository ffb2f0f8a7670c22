//! Base types and traits for the command pattern

use crate::config::Config;
use anyhow::Result;
use prflow_github::GitHubClient;

/// Context passed to all commands containing shared configuration and the API client
#[derive(Clone)]
pub struct CommandContext {
    /// The loaded configuration
    pub config: Config,
    /// Client every GitHub call goes through
    pub client: GitHubClient,
}

impl CommandContext {
    pub fn new(config: Config, client: GitHubClient) -> Self {
        Self { config, client }
    }
}

/// Trait that all commands must implement
#[async_trait::async_trait]
pub trait Command {
    /// Execute the command with the given context
    async fn execute(&self, context: &CommandContext) -> Result<()>;
}
