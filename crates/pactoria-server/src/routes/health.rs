use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use pactoria_ai::ProviderInfo;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub ai_configured: bool,
    pub ai_providers: Vec<ProviderInfo>,
    pub websocket_connections: usize,
}

/// Liveness plus dependency status. 503 when the database is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database_ok = match state.service.ping().await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(%error, "database ping failed");
            false
        }
    };
    let report = HealthReport {
        status: if database_ok { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if database_ok { "ok" } else { "unavailable" },
        ai_configured: state.ai.is_configured(),
        ai_providers: state.ai.providers(),
        websocket_connections: state.hub.connection_count(),
    };
    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
