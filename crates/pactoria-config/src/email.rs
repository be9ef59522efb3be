//! Outbound email configuration. Delivery is stubbed; these settings only
//! decide whether messages are recorded and what sender they carry.

use serde::{Deserialize, Serialize};

fn default_from_address() -> String {
    "noreply@pactoria.co.uk".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_from_address")]
    pub from_address: String,

    #[serde(default)]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from_address: default_from_address(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
        }
    }
}
