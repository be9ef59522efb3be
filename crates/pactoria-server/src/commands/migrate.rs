use anyhow::Context;

use pactoria_config::PactoriaConfig;
use pactoria_db::service::PactoriaService;

/// Handle `pactoria migrate`. Opening the database applies pending migrations.
pub async fn handle(config: &PactoriaConfig) -> anyhow::Result<()> {
    let path = &config.database.path;
    if config.database.is_in_memory() {
        tracing::warn!("database is in memory; migrations will not persist");
    }
    let service = PactoriaService::new_local(path)
        .await
        .with_context(|| format!("failed to migrate database at {path}"))?;
    service.ping().await.context("database did not answer after migration")?;

    let report = serde_json::json!({"database": path, "status": "migrated"});
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
