use axum::Json;
use axum::extract::State;

use pactoria_auth::RequirePermission;
use pactoria_core::entities::Company;
use pactoria_core::enums::Permission;
use pactoria_core::responses::SeatUsage;
use pactoria_db::updates::company::CompanyUpdate;

use crate::error::ApiResult;
use crate::extract::{ApiJson, CurrentUser};
use crate::state::AppState;

pub async fn get_company(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<Json<Company>> {
    Ok(Json(state.service.get_company(&identity.company_id).await?))
}

pub async fn update_company(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(update): ApiJson<CompanyUpdate>,
) -> ApiResult<Json<Company>> {
    identity.require(Permission::ManageCompany)?;
    Ok(Json(state.service.update_company(&identity, update).await?))
}

pub async fn usage(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<Json<SeatUsage>> {
    Ok(Json(state.service.seat_usage(&identity.company_id).await?))
}
