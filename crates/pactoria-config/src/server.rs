//! HTTP server configuration.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

/// Default request body limit: 1 MiB.
const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

const fn default_expiry_scan_interval_secs() -> u64 {
    3600
}

const fn default_expiry_warning_days() -> u32 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed by the CORS middleware. Empty disables CORS headers.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// How often the background job scans for expiring contracts.
    #[serde(default = "default_expiry_scan_interval_secs")]
    pub expiry_scan_interval_secs: u64,

    /// Contracts ending within this many days get a `contract_expiring` notification.
    #[serde(default = "default_expiry_warning_days")]
    pub expiry_warning_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_allowed_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
            expiry_scan_interval_secs: default_expiry_scan_interval_secs(),
            expiry_warning_days: default_expiry_warning_days(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e| ConfigError::invalid("server.bind_addr", format!("{e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.max_body_bytes, 1_048_576);
        assert_eq!(config.expiry_warning_days, 30);
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn bad_bind_addr_is_invalid_value() {
        let config = ServerConfig {
            bind_addr: "localhost".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.socket_addr(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.bind_addr"
        ));
    }
}
