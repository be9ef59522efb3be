use anyhow::Context;

use pactoria_config::PactoriaConfig;

use crate::cli::GlobalFlags;

/// Load and validate configuration, honouring `--config`.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<PactoriaConfig> {
    let config = match &flags.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            PactoriaConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => PactoriaConfig::load_with_dotenv().context("failed to load config")?,
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}
