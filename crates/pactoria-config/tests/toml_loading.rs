//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use pactoria_config::PactoriaConfig;

#[test]
fn loads_server_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[server]
bind_addr = "0.0.0.0:9000"
cors_allowed_origins = ["https://app.pactoria.co.uk"]
max_body_bytes = 2048
expiry_scan_interval_secs = 60
expiry_warning_days = 14
"#,
        )?;

        let config: PactoriaConfig = Figment::from(Serialized::defaults(PactoriaConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(
            config.server.cors_allowed_origins,
            vec!["https://app.pactoria.co.uk"]
        );
        assert_eq!(config.server.max_body_bytes, 2048);
        assert_eq!(config.server.expiry_scan_interval_secs, 60);
        assert_eq!(config.server.expiry_warning_days, 14);
        Ok(())
    });
}

#[test]
fn loads_ai_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[ai]
providers = ["anthropic", "openai"]
max_retries = 1
use_mock = true

[ai.openai]
api_key = "sk-openai"
base_url = "http://localhost:8080"

[ai.anthropic]
api_key = "sk-ant"
model = "claude-3-5-sonnet-latest"
"#,
        )?;

        let config: PactoriaConfig = Figment::from(Serialized::defaults(PactoriaConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.ai.providers, vec!["anthropic", "openai"]);
        assert_eq!(config.ai.max_retries, 1);
        assert!(config.ai.use_mock);
        assert_eq!(config.ai.openai.api_key, "sk-openai");
        assert_eq!(config.ai.openai.base_url, "http://localhost:8080");
        // Unset sub-fields keep their defaults.
        assert_eq!(config.ai.openai.model, "gpt-4o-mini");
        assert_eq!(config.ai.anthropic.model, "claude-3-5-sonnet-latest");
        Ok(())
    });
}

#[test]
fn partial_section_keeps_other_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[general]
max_page_size = 50
"#,
        )?;

        let config: PactoriaConfig = Figment::from(Serialized::defaults(PactoriaConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.general.max_page_size, 50);
        assert_eq!(config.general.default_page_size, 20);
        assert_eq!(config.auth.token_ttl_minutes, 1440);
        assert_eq!(config.database.path, "pactoria.db");
        Ok(())
    });
}

#[test]
fn env_var_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[auth]
jwt_secret = "from-toml"
"#,
        )?;
        jail.set_env("PACTORIA_AUTH__JWT_SECRET", "from-env");

        let config: PactoriaConfig = Figment::from(Serialized::defaults(PactoriaConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("PACTORIA_").split("__"))
            .extract()?;

        assert_eq!(config.auth.jwt_secret, "from-env");
        Ok(())
    });
}

#[test]
fn nested_env_var_reaches_provider_section() {
    Jail::expect_with(|jail| {
        jail.set_env("PACTORIA_AI__ANTHROPIC__API_KEY", "sk-ant-env");
        jail.set_env("PACTORIA_DATABASE__PATH", ":memory:");

        let config = PactoriaConfig::load().expect("config loads");

        assert_eq!(config.ai.anthropic.api_key, "sk-ant-env");
        assert!(config.ai.is_configured());
        assert!(config.database.is_in_memory());
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_load() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "pactoria.toml",
            r#"
[email]
enabled = true
from_address = "contracts@acme.co.uk"
"#,
        )?;

        let config = PactoriaConfig::load().expect("config loads");

        assert!(config.email.enabled);
        assert_eq!(config.email.from_address, "contracts@acme.co.uk");
        assert_eq!(config.email.smtp_port, 587);
        Ok(())
    });
}

#[test]
fn explicit_config_path_replaces_project_file() {
    Jail::expect_with(|jail| {
        jail.create_file("pactoria.toml", "[database]\npath = \"project.db\"\n")?;
        jail.create_file("custom.toml", "[database]\npath = \"custom.db\"\n")?;

        let config = PactoriaConfig::load_from(std::path::Path::new("custom.toml"))
            .expect("config loads");

        assert_eq!(config.database.path, "custom.db");
        Ok(())
    });
}

#[test]
fn typo_env_var_silently_ignored() {
    Jail::expect_with(|jail| {
        jail.set_env("PACTORIA_SERVR__BIND_ADDR", "0.0.0.0:1");

        let config = PactoriaConfig::load().expect("config loads");

        assert_eq!(config.server.bind_addr, "127.0.0.1:8000");
        Ok(())
    });
}
