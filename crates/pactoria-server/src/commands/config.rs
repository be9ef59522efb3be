use pactoria_config::PactoriaConfig;

/// Handle `pactoria config`.
pub fn handle(config: &PactoriaConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
