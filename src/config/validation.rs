//! Configuration validation utilities

use super::Config;
use anyhow::anyhow;

/// Enumeration of possible validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No token in the file and none in the environment
    MissingToken,
    /// Account name is empty
    EmptyAccount,
    /// API base is not an http(s) URL
    InvalidApiBase(String),
    /// Timeout of zero seconds
    ZeroTimeout,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingToken => write!(
                f,
                "GitHub token not provided. Set 'token' in the config file or the GITHUB_TOKEN environment variable"
            ),
            ValidationError::EmptyAccount => write!(f, "Account name cannot be empty"),
            ValidationError::InvalidApiBase(base) => {
                write!(f, "API base must be an http(s) URL: '{}'", base)
            }
            ValidationError::ZeroTimeout => write!(f, "timeout_secs must be greater than zero"),
        }
    }
}

/// Validate a loaded configuration, collecting every problem
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.token.trim().is_empty() {
        errors.push(ValidationError::MissingToken);
    }

    if config.account.trim().is_empty() {
        errors.push(ValidationError::EmptyAccount);
    }

    if let Some(base) = &config.api_base
        && !(base.starts_with("https://") || base.starts_with("http://"))
    {
        errors.push(ValidationError::InvalidApiBase(base.clone()));
    }

    if config.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Convert validation errors to anyhow::Error
pub fn validation_errors_to_anyhow(errors: Vec<ValidationError>) -> anyhow::Error {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    anyhow!("Configuration validation failed:\n  {}", messages.join("\n  "))
}
