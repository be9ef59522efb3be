use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use pactoria_auth::RequirePermission;
use pactoria_core::entities::{LegalTemplate, NewTemplate};
use pactoria_core::enums::{ContractType, Permission, TemplateStatus};
use pactoria_core::pagination::Page;
use pactoria_db::repos::templates::TemplateFilter;
use pactoria_db::updates::template::TemplateUpdate;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub category: Option<ContractType>,
    pub status: Option<TemplateStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TemplateStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub template_id: String,
    pub content: String,
}

pub async fn list_templates(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Page<LegalTemplate>>> {
    let filter = TemplateFilter {
        category: params.category,
        status: params.status,
    };
    let page = state.page(params.page, params.size);
    Ok(Json(state.service.list_templates(&identity.company_id, &filter, page).await?))
}

pub async fn create_template(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(input): ApiJson<NewTemplate>,
) -> ApiResult<(StatusCode, Json<LegalTemplate>)> {
    identity.require(Permission::ManageTemplates)?;
    let template = state.service.create_template(&identity, input).await?;
    tracing::info!(template_id = %template.id, "template created");
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn get_template(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<LegalTemplate>> {
    Ok(Json(state.service.get_template(&identity.company_id, &id).await?))
}

pub async fn update_template(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(update): ApiJson<TemplateUpdate>,
) -> ApiResult<Json<LegalTemplate>> {
    identity.require(Permission::ManageTemplates)?;
    Ok(Json(state.service.update_template(&identity, &id, update).await?))
}

pub async fn delete_template(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    identity.require(Permission::ManageTemplates)?;
    state.service.delete_template(&identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<LegalTemplate>> {
    identity.require(Permission::ManageTemplates)?;
    Ok(Json(state.service.transition_template(&identity, &id, req.status).await?))
}

/// Fill the template's placeholders without creating anything.
pub async fn render(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<RenderRequest>,
) -> ApiResult<Json<RenderResponse>> {
    let template = state.service.get_template(&identity.company_id, &id).await?;
    let content = template.render(&req.values)?;
    Ok(Json(RenderResponse {
        template_id: template.id,
        content,
    }))
}
