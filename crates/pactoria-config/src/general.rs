//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default page size for list and search endpoints.
const fn default_page_size() -> u32 {
    20
}

const fn default_max_page_size() -> u32 {
    100
}

const fn default_invitation_ttl_days() -> u32 {
    7
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Requested page sizes are clamped to this.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Days before a pending invitation expires.
    #[serde(default = "default_invitation_ttl_days")]
    pub invitation_ttl_days: u32,

    /// Base URL used for links in emails and notifications.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            invitation_ttl_days: default_invitation_ttl_days(),
            frontend_url: default_frontend_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_page_size, 100);
        assert_eq!(config.invitation_ttl_days, 7);
    }
}
