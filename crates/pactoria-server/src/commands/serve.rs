use anyhow::Context;
use chrono::TimeDelta;
use tokio::net::TcpListener;

use pactoria_auth::{TokenIssuer, generate_token_hex};
use pactoria_config::PactoriaConfig;
use pactoria_server::AppState;

use crate::cli::ServeArgs;

const DEV_SECRET_BYTES: usize = 32;

/// Handle `pactoria serve`.
pub async fn handle(args: &ServeArgs, mut config: PactoriaConfig) -> anyhow::Result<()> {
    if let Some(bind) = &args.bind {
        config.server.bind_addr.clone_from(bind);
    }
    let addr = config.server.socket_addr().context("invalid bind address")?;
    let tokens = token_issuer(&config, args.dev)?;
    if config.database.is_in_memory() {
        tracing::warn!("database is in memory; all data is lost on exit");
    }

    let state = AppState::from_config(config, tokens).await?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "pactoria listening");

    pactoria_server::serve(state, listener, shutdown_signal())
        .await
        .context("server stopped with an error")?;
    tracing::info!("pactoria stopped");
    Ok(())
}

fn token_issuer(config: &PactoriaConfig, dev: bool) -> anyhow::Result<TokenIssuer> {
    if dev && !config.auth.is_configured() {
        tracing::warn!("--dev: signing tokens with an ephemeral secret; tokens will not survive a restart");
        let secret = generate_token_hex(DEV_SECRET_BYTES)?;
        let ttl = i64::try_from(config.auth.token_ttl_minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .context("auth.token_ttl_minutes is too large")?;
        return Ok(TokenIssuer::new(&secret, config.auth.issuer.clone(), ttl)?);
    }
    let auth = config
        .require_auth()
        .context("set PACTORIA_AUTH__JWT_SECRET or run with --dev")?;
    Ok(TokenIssuer::from_config(auth)?)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for ctrl-c; stop the process to exit");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use pactoria_config::PactoriaConfig;

    use super::token_issuer;

    #[test]
    fn dev_mode_supplies_a_secret() {
        let config = PactoriaConfig::default();
        assert!(token_issuer(&config, true).is_ok());
    }

    #[test]
    fn missing_secret_is_an_error_outside_dev() {
        let config = PactoriaConfig::default();
        let error = token_issuer(&config, false).unwrap_err();
        assert!(format!("{error:#}").contains("PACTORIA_AUTH__JWT_SECRET"));
    }
}
