use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;

use pactoria_auth::RequirePermission;
use pactoria_core::entities::IntegrationConnection;
use pactoria_core::enums::{IntegrationProvider, Permission};
use pactoria_core::responses::IntegrationInfo;

use crate::error::ApiResult;
use crate::extract::{ApiPath, CurrentUser, OptionalJson};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectRequest {
    /// Provider settings stored with the connection.
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

pub async fn catalog(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<Json<Vec<IntegrationInfo>>> {
    Ok(Json(state.service.integration_catalog(&identity.company_id).await?))
}

pub async fn connect(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(provider): ApiPath<IntegrationProvider>,
    OptionalJson(req): OptionalJson<ConnectRequest>,
) -> ApiResult<Json<IntegrationConnection>> {
    identity.require(Permission::ManageIntegrations)?;
    let connection = state
        .service
        .connect_integration(&identity, provider, serde_json::Value::Object(req.config))
        .await?;
    Ok(Json(connection))
}

pub async fn disconnect(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(provider): ApiPath<IntegrationProvider>,
) -> ApiResult<Json<IntegrationConnection>> {
    identity.require(Permission::ManageIntegrations)?;
    Ok(Json(state.service.disconnect_integration(&identity, provider).await?))
}

/// Record a sync. No provider API is called.
pub async fn sync(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(provider): ApiPath<IntegrationProvider>,
) -> ApiResult<Json<IntegrationConnection>> {
    identity.require(Permission::ManageIntegrations)?;
    Ok(Json(
        state
            .service
            .record_integration_sync(&identity, provider, Utc::now())
            .await?,
    ))
}
