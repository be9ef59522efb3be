use figment::Jail;
use pactoria_config::{ConfigError, PactoriaConfig};

#[test]
fn env_values_are_validated() {
    Jail::expect_with(|jail| {
        jail.set_env("PACTORIA_SERVER__BIND_ADDR", "not an address");

        let config = PactoriaConfig::load().expect("config loads");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.bind_addr"
        ));
        Ok(())
    });
}

#[test]
fn wrongly_typed_env_value_is_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("PACTORIA_GENERAL__MAX_PAGE_SIZE", "lots");

        assert!(matches!(
            PactoriaConfig::load(),
            Err(ConfigError::Figment(_))
        ));
        Ok(())
    });
}

#[test]
fn redacted_config_serializes_without_secrets() {
    Jail::expect_with(|jail| {
        jail.set_env("PACTORIA_AUTH__JWT_SECRET", "hunter2hunter2");

        let config = PactoriaConfig::load().expect("config loads");
        let shown = serde_json::to_string(&config.redacted()).expect("serializes");
        assert!(!shown.contains("hunter2"));
        Ok(())
    });
}
