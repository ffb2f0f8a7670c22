//! Configuration file loading

use super::validation;
use crate::constants;
use anyhow::{Context, Result};
use prflow_github::client::DEFAULT_API_BASE;
use prflow_github::{ClientOptions, Credentials};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Personal access token; may be left empty and supplied through `GITHUB_TOKEN`
    #[serde(default)]
    pub token: String,
    /// Login the token belongs to
    #[serde(alias = "username")]
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn new(token: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: account.into(),
            api_base: None,
            timeout_secs: None,
        }
    }

    /// Load and validate a configuration file
    ///
    /// An empty `token` is filled from the `GITHUB_TOKEN` environment variable.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;

        let mut config = Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path))?;
        config.apply_env_token(std::env::var(constants::config::TOKEN_ENV_VAR).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Use `token` when the file did not provide one
    pub fn apply_env_token(&mut self, token: Option<String>) {
        if self.token.trim().is_empty()
            && let Some(token) = token.filter(|t| !t.trim().is_empty())
        {
            self.token = token;
        }
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self).map_err(validation::validation_errors_to_anyhow)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.trim(), self.account.trim())
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Effective request deadline; `override_secs` wins over the file
    pub fn timeout(&self, override_secs: Option<u64>) -> Duration {
        let secs = override_secs
            .or(self.timeout_secs)
            .unwrap_or(constants::config::DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn client_options(&self, timeout_override: Option<u64>) -> ClientOptions {
        ClientOptions {
            api_base: self.api_base().to_string(),
            timeout: Some(self.timeout(timeout_override)),
            ..ClientOptions::default()
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("account", &self.account)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
