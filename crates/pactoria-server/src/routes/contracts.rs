use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use pactoria_ai::{ClauseText, ComplianceReport, GenerationRequest, TokenUsage};
use pactoria_auth::RequirePermission;
use pactoria_core::entities::{Contract, ContractVersion, NewContract};
use pactoria_core::enums::{ContractStatus, ContractType, Permission};
use pactoria_core::errors::CoreError;
use pactoria_core::identity::AuthIdentity;
use pactoria_core::pagination::Page;
use pactoria_db::repos::contracts::{ContractListFilter, GeneratedContent};
use pactoria_db::updates::contract::ContractUpdate;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, CurrentUser, OptionalJson};
use crate::fanout;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub status: Option<ContractStatus>,
    pub contract_type: Option<ContractType>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ContractStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateOptions {
    /// Approved clauses the draft must include.
    #[serde(default)]
    pub clause_ids: Vec<String>,
    /// Values for the contract's template placeholders.
    #[serde(default)]
    pub template_values: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub contract: Contract,
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
    pub elapsed_ms: u64,
    pub compliance: ComplianceReport,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub contract: Contract,
    pub provider: String,
    pub model: String,
    pub compliance_score: f64,
    pub risk_score: f64,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub compliance: ComplianceReport,
}

pub async fn create_contract(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiJson(input): ApiJson<NewContract>,
) -> ApiResult<(StatusCode, Json<Contract>)> {
    identity.require(Permission::EditContracts)?;
    let contract = state.service.create_contract(&identity, input).await?;
    tracing::info!(contract_id = %contract.id, contract_type = %contract.contract_type, "contract created");
    fanout::contract_created(&state, &contract).await;
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn list_contracts(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Page<Contract>>> {
    let filter = ContractListFilter {
        status: params.status,
        contract_type: params.contract_type,
    };
    let page = state.page(params.page, params.size);
    Ok(Json(state.service.list_contracts(&identity.company_id, &filter, page).await?))
}

pub async fn get_contract(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Contract>> {
    Ok(Json(state.service.get_contract(&identity.company_id, &id).await?))
}

pub async fn update_contract(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(update): ApiJson<ContractUpdate>,
) -> ApiResult<Json<Contract>> {
    identity.require(Permission::EditContracts)?;
    Ok(Json(state.service.update_contract(&identity, &id, update).await?))
}

pub async fn delete_contract(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    identity.require(Permission::EditContracts)?;
    state.service.delete_contract(&identity, &id).await?;
    tracing::info!(contract_id = %id, "contract deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<Contract>> {
    identity.require(Permission::EditContracts)?;
    if req.status.requires_approval_rights() {
        identity.require(Permission::ApproveContracts)?;
    }
    let before = state.service.get_contract(&identity.company_id, &id).await?;
    let contract = state.service.transition_contract(&identity, &id, req.status).await?;
    tracing::info!(contract_id = %id, from = %before.status, to = %contract.status, "contract status changed");
    fanout::contract_status_changed(&state, &contract, before.status).await;
    Ok(Json(contract))
}

pub async fn list_versions(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Vec<ContractVersion>>> {
    Ok(Json(state.service.list_versions(&identity.company_id, &id).await?))
}

/// Assemble the drafting request: contract fields, the rendered template
/// it was created from, and the requested approved clauses.
async fn generation_request(
    state: &AppState,
    identity: &AuthIdentity,
    contract: &Contract,
    options: &GenerateOptions,
) -> ApiResult<GenerationRequest> {
    let mut request = GenerationRequest::from_contract(contract);
    if let Some(template_id) = &contract.template_id {
        let template = state.service.get_template(&identity.company_id, template_id).await?;
        request.template_text = Some(template.render(&options.template_values)?);
    }
    if !options.clause_ids.is_empty() {
        let clauses = state
            .service
            .approved_clauses(&identity.company_id, &options.clause_ids)
            .await?;
        request.clauses = clauses
            .into_iter()
            .map(|c| ClauseText {
                title: c.title,
                content: c.content,
            })
            .collect();
    }
    Ok(request)
}

pub async fn generate(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
    OptionalJson(options): OptionalJson<GenerateOptions>,
) -> ApiResult<Json<GenerationResponse>> {
    identity.require(Permission::EditContracts)?;
    let contract = state.service.get_contract(&identity.company_id, &id).await?;
    if !contract.status.is_editable() {
        return Err(CoreError::business_rule(format!(
            "contract {id} is {} and cannot be regenerated",
            contract.status
        ))
        .into());
    }

    let request = generation_request(&state, &identity, &contract, &options).await?;
    let completion = state.ai.generate_contract(&request).await?;
    let compliance = state.ai.checker().check(&completion.text, Some(contract.contract_type));
    let generated = GeneratedContent {
        content: completion.text.clone(),
        model: completion.model.clone(),
        compliance_score: Some(compliance.overall_score),
        risk_score: Some(compliance.risk_score),
    };
    let contract = state.service.store_generation(&identity, &id, &generated).await?;
    tracing::info!(
        contract_id = %id,
        provider = %completion.provider,
        model = %completion.model,
        tokens = completion.usage.total(),
        elapsed_ms = completion.elapsed_ms,
        "contract generated"
    );

    fanout::contract_generated(&state, &contract).await;
    fanout::compliance_checked(&state, &contract, compliance.overall_score).await;
    Ok(Json(GenerationResponse {
        contract,
        provider: completion.provider,
        model: completion.model,
        usage: completion.usage,
        elapsed_ms: completion.elapsed_ms,
        compliance,
    }))
}

pub async fn analyze(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<AnalysisResponse>> {
    identity.require(Permission::EditContracts)?;
    let contract = state.service.get_contract(&identity.company_id, &id).await?;
    let Some(content) = contract.content() else {
        return Err(CoreError::business_rule(format!(
            "contract {id} has no content to analyze; generate or upload it first"
        ))
        .into());
    };

    let analysis = state
        .ai
        .analyze_contract(content, Some(contract.contract_type))
        .await?;
    let contract = state
        .service
        .store_analysis(&identity, &id, analysis.compliance_score, analysis.risk_score)
        .await?;
    tracing::info!(
        contract_id = %id,
        compliance_score = analysis.compliance_score,
        risk_score = analysis.risk_score,
        "contract analyzed"
    );
    fanout::compliance_checked(&state, &contract, analysis.compliance_score).await;

    Ok(Json(AnalysisResponse {
        contract,
        provider: analysis.completion.provider,
        model: analysis.completion.model,
        compliance_score: analysis.compliance_score,
        risk_score: analysis.risk_score,
        warnings: analysis.findings.warnings,
        suggestions: analysis.findings.suggestions,
        compliance: analysis.compliance,
    }))
}
