use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use pactoria_auth::RequirePermission;
use pactoria_core::entities::{LegalClause, NewClause};
use pactoria_core::enums::{ClauseCategory, ClauseStatus, Permission, RiskLevel};
use pactoria_core::pagination::Page;
use pactoria_db::repos::clauses::ClauseFilter;
use pactoria_db::updates::clause::ClauseUpdate;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub q: Option<String>,
    pub category: Option<ClauseCategory>,
    pub risk_level: Option<RiskLevel>,
    pub status: Option<ClauseStatus>,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ClauseStatus,
}

pub async fn list_clauses(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Page<LegalClause>>> {
    let page = state.page(params.page, params.size);
    let filter = ClauseFilter {
        text: params.q,
        category: params.category,
        risk_level: params.risk_level,
        status: params.status,
        tag: params.tag,
    };
    Ok(Json(state.service.list_clauses(&identity.company_id, &filter, page).await?))
}

pub async fn create_clause(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(input): ApiJson<NewClause>,
) -> ApiResult<(StatusCode, Json<LegalClause>)> {
    identity.require(Permission::ManageTemplates)?;
    let clause = state.service.create_clause(&identity, input).await?;
    tracing::info!(clause_id = %clause.id, category = %clause.category, "clause created");
    Ok((StatusCode::CREATED, Json(clause)))
}

pub async fn get_clause(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<LegalClause>> {
    Ok(Json(state.service.get_clause(&identity.company_id, &id).await?))
}

pub async fn update_clause(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(update): ApiJson<ClauseUpdate>,
) -> ApiResult<Json<LegalClause>> {
    identity.require(Permission::ManageTemplates)?;
    Ok(Json(state.service.update_clause(&identity, &id, update).await?))
}

pub async fn delete_clause(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    identity.require(Permission::ManageTemplates)?;
    state.service.delete_clause(&identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<LegalClause>> {
    identity.require(Permission::ManageTemplates)?;
    Ok(Json(state.service.transition_clause(&identity, &id, req.status).await?))
}
