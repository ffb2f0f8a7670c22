//! Command argument validation utilities
//!
//! This module provides centralized validation logic for command arguments
//! after clap parsing. It handles domain-specific validation rules that
//! go beyond basic argument parsing.

use anyhow::{Result, anyhow};

/// Validation errors for command arguments
#[derive(Debug, PartialEq)]
pub enum CommandValidationError {
    /// Mutually exclusive arguments were both provided
    MutualExclusivity { first: String, second: String },
    /// Invalid argument value
    InvalidValue {
        argument: String,
        value: String,
        reason: String,
    },
}

impl std::fmt::Display for CommandValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandValidationError::MutualExclusivity { first, second } => {
                write!(f, "Cannot specify both {} and {}", first, second)
            }
            CommandValidationError::InvalidValue {
                argument,
                value,
                reason,
            } => {
                write!(f, "Invalid value '{}' for {}: {}", value, argument, reason)
            }
        }
    }
}

impl std::error::Error for CommandValidationError {}

/// Convert validation error to anyhow::Error
pub fn validation_error_to_anyhow(error: CommandValidationError) -> anyhow::Error {
    anyhow!(error.to_string())
}

fn invalid(argument: &str, value: &str, reason: &str) -> anyhow::Error {
    validation_error_to_anyhow(CommandValidationError::InvalidValue {
        argument: argument.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

fn exclusive<A, B>(first: &Option<A>, second: &Option<B>, names: (&str, &str)) -> Result<()> {
    if first.is_some() && second.is_some() {
        return Err(validation_error_to_anyhow(
            CommandValidationError::MutualExclusivity {
                first: names.0.to_string(),
                second: names.1.to_string(),
            },
        ));
    }
    Ok(())
}

/// Validate how the target repository is chosen
///
/// `--repo` and `--index` are mutually exclusive; a name must not be blank.
pub fn validate_repository_choice(repo: &Option<String>, index: &Option<usize>) -> Result<()> {
    exclusive(repo, index, ("--repo", "--index"))?;
    if let Some(name) = repo
        && name.trim().is_empty()
    {
        return Err(invalid(
            "repository name",
            name,
            "repository name cannot be empty or whitespace only",
        ));
    }
    Ok(())
}

/// Validate where the file content comes from
pub fn validate_content_source(content: &Option<String>, file: &Option<String>) -> Result<()> {
    exclusive(content, file, ("--content", "--file"))?;
    if let Some(file) = file
        && file.trim().is_empty()
    {
        return Err(invalid("file", file, "file path cannot be empty"));
    }
    Ok(())
}

/// Validate branch name
///
/// Ensures branch names follow basic Git naming conventions
pub fn validate_branch_name(argument: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid(
            argument,
            name,
            "branch name cannot be empty or whitespace only",
        ));
    }

    if name.starts_with('-')
        || name.starts_with('/')
        || name.ends_with('/')
        || name.ends_with('.')
        || name.ends_with(".lock")
        || name.contains("..")
        || name.contains("@{")
        || name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
    {
        return Err(invalid(argument, name, "invalid Git branch name format"));
    }
    Ok(())
}

/// Validate the repository path of the file to commit
pub fn validate_file_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid("path", path, "path cannot be empty"));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(invalid(
            "path",
            path,
            "path must be relative to the repository root and name a file",
        ));
    }
    if path.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Err(invalid("path", path, "path cannot contain empty, '.' or '..' segments"));
    }
    Ok(())
}

/// Validate commit message
///
/// Ensures commit messages are not empty when provided
pub fn validate_commit_message(message: &Option<String>) -> Result<()> {
    if let Some(msg) = message
        && msg.trim().is_empty()
    {
        return Err(invalid(
            "commit message",
            msg,
            "commit message cannot be empty or whitespace only",
        ));
    }
    Ok(())
}

/// Validate pull request title
pub fn validate_title(title: &Option<String>) -> Result<()> {
    if let Some(title) = title
        && title.trim().is_empty()
    {
        return Err(invalid("title", title, "title cannot be empty or whitespace only"));
    }
    Ok(())
}

/// Validate the request timeout override
pub fn validate_timeout(timeout: &Option<u64>) -> Result<()> {
    if *timeout == Some(0) {
        return Err(invalid("timeout", "0", "timeout must be at least one second"));
    }
    Ok(())
}
