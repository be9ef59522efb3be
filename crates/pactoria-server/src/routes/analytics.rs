use axum::Json;
use axum::extract::State;
use chrono::Utc;

use pactoria_core::responses::{ComplianceOverview, DashboardStats};

use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<Json<DashboardStats>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.service.dashboard(&identity.company_id, today).await?))
}

pub async fn compliance(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
) -> ApiResult<Json<ComplianceOverview>> {
    Ok(Json(state.service.compliance_overview(&identity.company_id).await?))
}
