use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use pactoria_ai::{ComplianceReport, GenerationRequest, ProviderInfo, TokenUsage};
use pactoria_auth::RequirePermission;
use pactoria_core::enums::{ContractType, Permission};
use pactoria_core::validation::{self, MAX_TITLE_LEN};

use crate::error::ApiResult;
use crate::extract::{ApiJson, CurrentUser};
use crate::state::AppState;

/// Upper bound on text sent for review.
pub(crate) const MAX_REVIEW_CONTENT_LEN: usize = 200_000;

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
    pub elapsed_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub content: String,
    #[serde(default)]
    pub contract_type: Option<ContractType>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub provider: String,
    pub model: String,
    pub compliance_score: f64,
    pub risk_score: f64,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub compliance: ComplianceReport,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub configured: bool,
    pub providers: Vec<ProviderInfo>,
}

/// Draft contract text without storing anything.
pub async fn generate(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(mut request): ApiJson<GenerationRequest>,
) -> ApiResult<Json<DraftResponse>> {
    identity.require(Permission::EditContracts)?;
    request.title = validation::required_text("title", &request.title, MAX_TITLE_LEN)?;
    validation::contract_value(request.contract_value)?;
    validation::date_range(request.start_date, request.end_date)?;

    let completion = state.ai.generate_contract(&request).await?;
    tracing::info!(
        provider = %completion.provider,
        tokens = completion.usage.total(),
        elapsed_ms = completion.elapsed_ms,
        "ad hoc draft generated"
    );
    Ok(Json(DraftResponse {
        content: completion.text,
        provider: completion.provider,
        model: completion.model,
        usage: completion.usage,
        elapsed_ms: completion.elapsed_ms,
    }))
}

pub async fn analyze(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> ApiResult<Json<ReviewResponse>> {
    identity.require(Permission::EditContracts)?;
    let content = validation::required_text("content", &req.content, MAX_REVIEW_CONTENT_LEN)?;
    let analysis = state.ai.analyze_contract(&content, req.contract_type).await?;
    Ok(Json(ReviewResponse {
        provider: analysis.completion.provider,
        model: analysis.completion.model,
        compliance_score: analysis.compliance_score,
        risk_score: analysis.risk_score,
        warnings: analysis.findings.warnings,
        suggestions: analysis.findings.suggestions,
        compliance: analysis.compliance,
    }))
}

pub async fn providers(State(state): State<AppState>, _user: CurrentUser) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        configured: state.ai.is_configured(),
        providers: state.ai.providers(),
    })
}
