//! Central constants for the prflow application

/// Default values for configuration
pub mod config {
    /// Default configuration file name
    pub const DEFAULT_CONFIG_FILE: &str = "config.json";

    /// Environment variable that supplies the token when the file has none
    pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

    /// Default per-request deadline in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}

/// Defaults for the publish command
pub mod publish {
    pub const DEFAULT_BRANCH: &str = "add-hello-file";

    pub const DEFAULT_PATH: &str = "Hello.txt";

    pub const DEFAULT_CONTENT: &str = "Hello world";
}
