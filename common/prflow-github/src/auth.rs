//! Credentials used to authenticate every API call

use std::fmt;

/// Token and account the client acts as
///
/// Loaded once at startup and never modified afterwards. The account is the
/// default owner for repositories the workflow touches.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    account: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: account.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Value of the `Authorization` header
    pub fn get_auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_header() {
        let credentials = Credentials::new("ghp_test_token_1234567890", "octo");
        assert_eq!(
            credentials.get_auth_header(),
            "Bearer ghp_test_token_1234567890"
        );
        assert_eq!(credentials.account(), "octo");
    }

    #[test]
    fn test_debug_hides_token() {
        let credentials = Credentials::new("ghp_secret", "octo");
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("octo"));
    }
}
