//! # pactoria-config
//!
//! Layered configuration loading for Pactoria using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`PACTORIA_*` prefix, `__` as separator)
//! 2. Project-level `./pactoria.toml` (or the file passed with `--config`)
//! 3. User-level `~/.config/pactoria/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `PACTORIA_AUTH__JWT_SECRET` -> `auth.jwt_secret`,
//! `PACTORIA_AI__OPENAI__API_KEY` -> `ai.openai.api_key`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use pactoria_config::PactoriaConfig;
//!
//! let config = PactoriaConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//!
//! if !config.auth.is_configured() {
//!     eprintln!("set PACTORIA_AUTH__JWT_SECRET");
//! }
//! ```

mod ai;
mod auth;
mod database;
mod email;
mod error;
mod general;
mod server;

pub use ai::{AiConfig, ProviderConfig};
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const REDACTED: &str = "********";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PactoriaConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl PactoriaConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Load with `.env` support, reading the project layer from `path`
    /// instead of `./pactoria.toml`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::figment_with(Some(path))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        Self::figment_with(None)
    }

    fn figment_with(project_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path =
            project_file.map_or_else(|| PathBuf::from("pactoria.toml"), Path::to_path_buf);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("PACTORIA_").split("__"))
    }

    /// Cross-field checks that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;
        if self.general.max_page_size == 0 {
            return Err(ConfigError::invalid(
                "general.max_page_size",
                "must be greater than zero",
            ));
        }
        if self.general.default_page_size == 0
            || self.general.default_page_size > self.general.max_page_size
        {
            return Err(ConfigError::invalid(
                "general.default_page_size",
                format!("must be between 1 and {}", self.general.max_page_size),
            ));
        }
        if self.auth.token_ttl_minutes == 0 {
            return Err(ConfigError::invalid(
                "auth.token_ttl_minutes",
                "must be greater than zero",
            ));
        }
        if self.ai.base_delay_ms > self.ai.max_delay_ms {
            return Err(ConfigError::invalid(
                "ai.base_delay_ms",
                "must not exceed ai.max_delay_ms",
            ));
        }
        Ok(())
    }

    /// Require a signing secret, as the server does outside `--dev`.
    pub fn require_auth(&self) -> Result<&AuthConfig, ConfigError> {
        if self.auth.is_configured() {
            Ok(&self.auth)
        } else {
            Err(ConfigError::NotConfigured {
                section: "auth".to_string(),
            })
        }
    }

    /// A copy with secrets masked, for `pactoria config`.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in [
            &mut copy.auth.jwt_secret,
            &mut copy.ai.openai.api_key,
            &mut copy.ai.anthropic.api_key,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        copy
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pactoria").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) or current dir looking
    /// for a `.env` file. Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PactoriaConfig::default();
        assert!(!config.auth.is_configured());
        assert!(!config.ai.is_configured());
        assert!(!config.email.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn figment_builds_without_files() {
        let config: PactoriaConfig = PactoriaConfig::figment()
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.general.default_page_size, 20);
        assert_eq!(config.database.path, "pactoria.db");
    }

    #[test]
    fn page_size_bounds_checked() {
        let mut config = PactoriaConfig::default();
        config.general.default_page_size = 500;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "general.default_page_size"
        ));
        config.general.default_page_size = 20;
        config.general.max_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn require_auth_without_secret() {
        let config = PactoriaConfig::default();
        assert!(matches!(
            config.require_auth(),
            Err(ConfigError::NotConfigured { section }) if section == "auth"
        ));
    }

    #[test]
    fn redacted_masks_only_set_secrets() {
        let mut config = PactoriaConfig::default();
        config.auth.jwt_secret = "super-secret".into();
        config.ai.openai.api_key = "sk-live".into();
        let shown = config.redacted();
        assert_eq!(shown.auth.jwt_secret, REDACTED);
        assert_eq!(shown.ai.openai.api_key, REDACTED);
        assert!(shown.ai.anthropic.api_key.is_empty());
        assert_eq!(config.auth.jwt_secret, "super-secret");
    }
}
