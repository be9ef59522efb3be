use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use pactoria_auth::RequirePermission;
use pactoria_core::entities::{Contract, WizardSession};
use pactoria_core::enums::Permission;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, CurrentUser};
use crate::fanout;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CompletedWizard {
    pub session: WizardSession,
    pub contract: Contract,
}

pub async fn start(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<(StatusCode, Json<WizardSession>)> {
    identity.require(Permission::EditContracts)?;
    let session = state.service.start_wizard(&identity).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<WizardSession>> {
    Ok(Json(state.service.get_wizard(&identity, &id).await?))
}

pub async fn save_step(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath((id, step)): ApiPath<(String, u8)>,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> ApiResult<Json<WizardSession>> {
    identity.require(Permission::EditContracts)?;
    Ok(Json(state.service.save_wizard_step(&identity, &id, step, payload).await?))
}

pub async fn complete(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<(StatusCode, Json<CompletedWizard>)> {
    identity.require(Permission::EditContracts)?;
    let (session, contract) = state.service.complete_wizard(&identity, &id).await?;
    tracing::info!(wizard_id = %id, contract_id = %contract.id, "wizard completed");
    fanout::contract_created(&state, &contract).await;
    Ok((StatusCode::CREATED, Json(CompletedWizard { session, contract })))
}

pub async fn abandon(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<WizardSession>> {
    Ok(Json(state.service.abandon_wizard(&identity, &id).await?))
}
