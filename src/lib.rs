//! prflow - publish a file to one of your GitHub repositories as a pull request

pub mod commands;
pub mod config;
pub mod constants;

pub use prflow_github as github;

pub type Result<T> = anyhow::Result<T>;

// Re-export commonly used types
pub use commands::{Command, CommandContext};
pub use config::Config;

