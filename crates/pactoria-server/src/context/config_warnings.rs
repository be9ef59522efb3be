use pactoria_config::PactoriaConfig;

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &PactoriaConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &PactoriaConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.auth.is_configured() && has_single_underscore_key(&env_keys, "PACTORIA_AUTH") {
        warnings.push(
            "Auth config appears default while PACTORIA_AUTH* env vars exist. Use double underscores (example: PACTORIA_AUTH__JWT_SECRET)."
                .to_string(),
        );
    }

    if !config.ai.is_configured() && has_single_underscore_key(&env_keys, "PACTORIA_AI") {
        warnings.push(
            "AI config appears default while PACTORIA_AI* env vars exist. Use double underscores (example: PACTORIA_AI__OPENAI__API_KEY)."
                .to_string(),
        );
    }

    if !config.email.enabled && has_single_underscore_key(&env_keys, "PACTORIA_EMAIL") {
        warnings.push(
            "Email config appears default while PACTORIA_EMAIL* env vars exist. Use double underscores (example: PACTORIA_EMAIL__ENABLED)."
                .to_string(),
        );
    }

    warnings
}

/// A key under `prefix` that is not `prefix__...`, e.g. `PACTORIA_AUTH_JWT_SECRET`.
fn has_single_underscore_key(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| {
        key.strip_prefix(prefix)
            .is_some_and(|rest| !rest.is_empty() && !rest.starts_with("__"))
    })
}
