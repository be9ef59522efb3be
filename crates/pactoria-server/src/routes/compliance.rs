//! Offline compliance checks. These never call a provider.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use pactoria_ai::ComplianceReport;
use pactoria_core::errors::CoreError;
use pactoria_core::validation;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, CurrentUser};
use crate::routes::ai::{MAX_REVIEW_CONTENT_LEN, ReviewRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ContractCompliance {
    pub contract_id: String,
    pub report: ComplianceReport,
}

pub async fn check(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> ApiResult<Json<ComplianceReport>> {
    let content = validation::required_text("content", &req.content, MAX_REVIEW_CONTENT_LEN)?;
    Ok(Json(state.ai.checker().check(&content, req.contract_type)))
}

pub async fn check_contract(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<ContractCompliance>> {
    let contract = state.service.get_contract(&identity.company_id, &id).await?;
    let Some(content) = contract.content() else {
        return Err(CoreError::business_rule(format!("contract {id} has no content to check")).into());
    };
    let report = state.ai.checker().check(content, Some(contract.contract_type));
    Ok(Json(ContractCompliance {
        contract_id: contract.id,
        report,
    }))
}
