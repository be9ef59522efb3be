use axum::Json;
use axum::extract::State;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use pactoria_core::entities::{Contract, LegalClause, LegalTemplate};
use pactoria_core::enums::{ClauseCategory, ContractStatus, ContractType, RiskLevel, TemplateStatus};
use pactoria_core::pagination::{Page, SortDirection};
use pactoria_db::repos::search::{ClauseSearch, ContractSearch, TemplateSearch};

use crate::error::ApiResult;
use crate::extract::{ApiQuery, CurrentUser, OptionalJson};
use crate::state::AppState;

/// Body of `POST /search/contracts`. Every field is optional; an empty body
/// lists all contracts newest first.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractSearchRequest {
    pub query: Option<String>,
    #[serde(default)]
    pub statuses: Vec<ContractStatus>,
    #[serde(default)]
    pub contract_types: Vec<ContractType>,
    pub client_name: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl From<ContractSearchRequest> for ContractSearch {
    fn from(req: ContractSearchRequest) -> Self {
        Self {
            text: req.query,
            statuses: req.statuses,
            contract_types: req.contract_types,
            client_name: req.client_name,
            min_value: req.min_value,
            max_value: req.max_value,
            start_date_from: req.start_date_from,
            start_date_to: req.start_date_to,
            created_from: req.created_from,
            created_to: req.created_to,
            sort_by: req.sort_by,
            direction: req.sort_direction,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateParams {
    pub q: Option<String>,
    pub category: Option<ContractType>,
    pub status: Option<TemplateStatus>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClauseParams {
    pub q: Option<String>,
    pub category: Option<ClauseCategory>,
    pub risk_level: Option<RiskLevel>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

pub async fn search_contracts(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    OptionalJson(req): OptionalJson<ContractSearchRequest>,
) -> ApiResult<Json<Page<Contract>>> {
    let page = state.page(req.page, req.size);
    let search = ContractSearch::from(req);
    Ok(Json(
        state
            .service
            .search_contracts(&identity.company_id, &search, page)
            .await?,
    ))
}

pub async fn search_templates(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiQuery(params): ApiQuery<TemplateParams>,
) -> ApiResult<Json<Page<LegalTemplate>>> {
    let page = state.page(params.page, params.size);
    let search = TemplateSearch {
        text: params.q,
        category: params.category,
        status: params.status,
    };
    Ok(Json(
        state
            .service
            .search_templates(&identity.company_id, &search, page)
            .await?,
    ))
}

pub async fn search_clauses(
    State(state): State<AppState>,
    CurrentUser { identity, .. }: CurrentUser,
    ApiQuery(params): ApiQuery<ClauseParams>,
) -> ApiResult<Json<Page<LegalClause>>> {
    let page = state.page(params.page, params.size);
    let search = ClauseSearch {
        text: params.q,
        category: params.category,
        risk_level: params.risk_level,
    };
    Ok(Json(
        state
            .service
            .search_clauses(&identity.company_id, &search, page)
            .await?,
    ))
}
