//! Access token configuration.

use serde::{Deserialize, Serialize};

/// Default token lifetime: 24 hours.
const fn default_token_ttl_minutes() -> u64 {
    1440
}

fn default_issuer() -> String {
    "pactoria".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HMAC secret for signing access tokens.
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: u64,

    /// Value of the `iss` claim; tokens from other issuers are rejected.
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_minutes: default_token_ttl_minutes(),
            issuer: default_issuer(),
        }
    }
}

impl AuthConfig {
    /// Check if a signing secret is present.
    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = AuthConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.token_ttl_minutes, 1440);
        assert_eq!(config.issuer, "pactoria");
    }

    #[test]
    fn configured_when_secret_set() {
        let config = AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
    }
}
