//! Filtered, sorted, paged search over contracts, templates, and clauses.
//!
//! Text queries go through the FTS5 shadow tables; every other filter is a
//! plain column predicate. Callers clamp the page size before calling in.

use chrono::{DateTime, NaiveDate, Utc};

use pactoria_core::entities::{Contract, LegalClause, LegalTemplate};
use pactoria_core::enums::{ClauseCategory, ContractStatus, ContractType, RiskLevel, TemplateStatus};
use pactoria_core::errors::CoreError;
use pactoria_core::pagination::{Page, PageRequest, SortDirection};

use crate::error::DatabaseError;
use crate::helpers::{format_date, fts_query, get_count};
use crate::repos::clauses::ClauseFilter;
use crate::repos::contracts::{SELECT_COLS as CONTRACT_COLS, row_to_contract};
use crate::repos::templates::{SELECT_COLS as TEMPLATE_COLS, VISIBLE_TO_COMPANY, row_to_template};
use crate::service::PactoriaService;

/// Columns a contract search may sort on.
pub const CONTRACT_SORT_FIELDS: &[&str] = &[
    "created_at",
    "updated_at",
    "title",
    "contract_value",
    "start_date",
    "end_date",
    "status",
];

/// Contract search criteria. Empty vectors and `None` mean "any".
#[derive(Debug, Clone, Default)]
pub struct ContractSearch {
    pub text: Option<String>,
    pub statuses: Vec<ContractStatus>,
    pub contract_types: Vec<ContractType>,
    pub client_name: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub sort_by: Option<String>,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateSearch {
    pub text: Option<String>,
    pub category: Option<ContractType>,
    pub status: Option<TemplateStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ClauseSearch {
    pub text: Option<String>,
    pub category: Option<ClauseCategory>,
    pub risk_level: Option<RiskLevel>,
}

/// Accumulates `WHERE` predicates with numbered placeholders.
struct Conditions {
    clauses: Vec<String>,
    params: Vec<libsql::Value>,
}

impl Conditions {
    fn scoped(predicate: &str, company_id: &str) -> Self {
        Self {
            clauses: vec![predicate.to_string()],
            params: vec![libsql::Value::Text(company_id.to_string())],
        }
    }

    /// Add `template` with every `{}` replaced by the next placeholder.
    fn push(&mut self, template: &str, value: impl Into<libsql::Value>) {
        self.params.push(value.into());
        self.clauses
            .push(template.replace("{}", &format!("?{}", self.params.len())));
    }

    fn push_any<T>(&mut self, column: &str, values: &[T], as_str: impl Fn(&T) -> &'static str) {
        if values.is_empty() {
            return;
        }
        let mut placeholders = Vec::with_capacity(values.len());
        for v in values {
            self.params.push(libsql::Value::Text(as_str(v).to_string()));
            placeholders.push(format!("?{}", self.params.len()));
        }
        self.clauses
            .push(format!("{column} IN ({})", placeholders.join(", ")));
    }

    fn sql(&self) -> String {
        self.clauses.join(" AND ")
    }
}

impl ContractSearch {
    fn order_by(&self) -> Result<String, CoreError> {
        let field = self.sort_by.as_deref().unwrap_or("created_at");
        if !CONTRACT_SORT_FIELDS.contains(&field) {
            return Err(CoreError::validation(
                "sort_by",
                format!("must be one of: {}", CONTRACT_SORT_FIELDS.join(", ")),
            ));
        }
        let collate = if field == "title" { " COLLATE NOCASE" } else { "" };
        Ok(format!(
            "{field}{collate} {dir}, rowid {dir}",
            dir = self.direction.as_sql()
        ))
    }

    fn validate(&self) -> Result<(), CoreError> {
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                return Err(CoreError::validation("min_value", "must not exceed max_value"));
            }
        }
        if let (Some(from), Some(to)) = (self.start_date_from, self.start_date_to) {
            if from > to {
                return Err(CoreError::validation("start_date_from", "must not be after start_date_to"));
            }
        }
        Ok(())
    }
}

impl PactoriaService {
    /// # Errors
    ///
    /// Returns a `Validation` core error for an unknown sort field or an
    /// inverted range.
    pub async fn search_contracts(
        &self,
        company_id: &str,
        search: &ContractSearch,
        page: PageRequest,
    ) -> Result<Page<Contract>, DatabaseError> {
        search.validate()?;
        let order_by = search.order_by()?;

        let mut conds = Conditions::scoped("company_id = ?1", company_id);
        if let Some(query) = search.text.as_deref().and_then(fts_query) {
            conds.push(
                "rowid IN (SELECT rowid FROM contracts_fts WHERE contracts_fts MATCH {})",
                query,
            );
        }
        conds.push_any("status", &search.statuses, |s| s.as_str());
        conds.push_any("contract_type", &search.contract_types, |t| t.as_str());
        if let Some(client) = search.client_name.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            conds.push("client_name LIKE {} COLLATE NOCASE", format!("%{client}%"));
        }
        if let Some(min) = search.min_value {
            conds.push("contract_value >= {}", min);
        }
        if let Some(max) = search.max_value {
            conds.push("contract_value <= {}", max);
        }
        if let Some(from) = search.start_date_from {
            conds.push("start_date >= {}", format_date(from));
        }
        if let Some(to) = search.start_date_to {
            conds.push("start_date <= {}", format_date(to));
        }
        if let Some(from) = search.created_from {
            conds.push("created_at >= {}", from.to_rfc3339());
        }
        if let Some(to) = search.created_to {
            conds.push("created_at <= {}", to.to_rfc3339());
        }
        let where_clause = conds.sql();

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM contracts WHERE {where_clause}"),
                libsql::params_from_iter(conds.params.clone()),
            )
            .await?;
        let total = get_count(&rows.next().await?.ok_or(DatabaseError::NoResult)?, 0)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {CONTRACT_COLS} FROM contracts WHERE {where_clause}
                     ORDER BY {order_by} LIMIT {} OFFSET {}",
                    page.size,
                    page.offset()
                ),
                libsql::params_from_iter(conds.params),
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_contract(&row)?);
        }
        tracing::debug!(company_id, total, "contract search");
        Ok(Page::new(items, total, page))
    }

    /// Search the caller's templates and the system templates.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn search_templates(
        &self,
        company_id: &str,
        search: &TemplateSearch,
        page: PageRequest,
    ) -> Result<Page<LegalTemplate>, DatabaseError> {
        let mut conds = Conditions::scoped(VISIBLE_TO_COMPANY, company_id);
        if let Some(query) = search.text.as_deref().and_then(fts_query) {
            conds.push(
                "rowid IN (SELECT rowid FROM templates_fts WHERE templates_fts MATCH {})",
                query,
            );
        }
        if let Some(category) = search.category {
            conds.push("category = {}", category.as_str());
        }
        if let Some(status) = search.status {
            conds.push("status = {}", status.as_str());
        }
        let where_clause = conds.sql();

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM templates WHERE {where_clause}"),
                libsql::params_from_iter(conds.params.clone()),
            )
            .await?;
        let total = get_count(&rows.next().await?.ok_or(DatabaseError::NoResult)?, 0)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {TEMPLATE_COLS} FROM templates WHERE {where_clause}
                     ORDER BY name COLLATE NOCASE, rowid LIMIT {} OFFSET {}",
                    page.size,
                    page.offset()
                ),
                libsql::params_from_iter(conds.params),
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_template(&row)?);
        }
        Ok(Page::new(items, total, page))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn search_clauses(
        &self,
        company_id: &str,
        search: &ClauseSearch,
        page: PageRequest,
    ) -> Result<Page<LegalClause>, DatabaseError> {
        let filter = ClauseFilter {
            text: search.text.clone(),
            category: search.category,
            risk_level: search.risk_level,
            ..ClauseFilter::default()
        };
        self.list_clauses(company_id, &filter, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{new_contract, register_company, test_service};
    use pactoria_core::entities::NewContract;
    use pretty_assertions::assert_eq;

    async fn seed(svc: &PactoriaService) -> pactoria_core::identity::AuthIdentity {
        let (_, admin) = register_company(svc, "Acme").await;
        let rows: [(&str, ContractType, &str, f64, &str); 4] = [
            ("Website build", ContractType::ServiceAgreement, "Globex Ltd", 12_000.0, "2025-01-01"),
            ("Office lease", ContractType::Lease, "Initech plc", 48_000.0, "2025-03-01"),
            ("Mutual NDA", ContractType::Nda, "Globex Ltd", 0.0, "2025-02-01"),
            ("Cloud hosting", ContractType::SupplierAgreement, "Hooli", 6_500.0, "2025-04-01"),
        ];
        for (title, kind, client, value, start) in rows {
            svc.create_contract(
                &admin,
                NewContract {
                    contract_type: kind,
                    client_name: Some(client.into()),
                    contract_value: Some(value),
                    start_date: Some(start.parse().unwrap()),
                    end_date: None,
                    ..new_contract(title)
                },
            )
            .await
            .unwrap();
        }
        admin
    }

    #[tokio::test]
    async fn text_and_filters() {
        let svc = test_service().await;
        let admin = seed(&svc).await;
        let page = PageRequest::new(1, 20);

        let hits = svc
            .search_contracts(
                &admin.company_id,
                &ContractSearch {
                    text: Some("leas".into()),
                    ..ContractSearch::default()
                },
                page,
            )
            .await
            .unwrap();
        assert_eq!(hits.total, 1);
        assert_eq!(hits.items[0].title, "Office lease");

        let globex = svc
            .search_contracts(
                &admin.company_id,
                &ContractSearch {
                    client_name: Some("globex".into()),
                    min_value: Some(1.0),
                    ..ContractSearch::default()
                },
                page,
            )
            .await
            .unwrap();
        assert_eq!(globex.total, 1);
        assert_eq!(globex.items[0].title, "Website build");

        let typed = svc
            .search_contracts(
                &admin.company_id,
                &ContractSearch {
                    contract_types: vec![ContractType::Nda, ContractType::Lease],
                    start_date_from: Some("2025-02-15".parse().unwrap()),
                    ..ContractSearch::default()
                },
                page,
            )
            .await
            .unwrap();
        assert_eq!(typed.total, 1);
        assert_eq!(typed.items[0].title, "Office lease");
    }

    #[tokio::test]
    async fn sorting_and_paging() {
        let svc = test_service().await;
        let admin = seed(&svc).await;
        let by_value = svc
            .search_contracts(
                &admin.company_id,
                &ContractSearch {
                    sort_by: Some("contract_value".into()),
                    direction: SortDirection::Desc,
                    ..ContractSearch::default()
                },
                PageRequest::new(2, 3),
            )
            .await
            .unwrap();
        assert_eq!(by_value.total, 4);
        assert_eq!(by_value.pages, 2);
        assert_eq!(by_value.items.len(), 1);
        assert_eq!(by_value.items[0].title, "Mutual NDA");

        let err = svc
            .search_contracts(
                &admin.company_id,
                &ContractSearch {
                    sort_by: Some("password_hash".into()),
                    ..ContractSearch::default()
                },
                PageRequest::new(1, 10),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation { field, .. }) if field == "sort_by"));
    }

    #[tokio::test]
    async fn other_tenants_are_invisible() {
        let svc = test_service().await;
        seed(&svc).await;
        let (_, globex) = register_company(&svc, "Globex").await;
        let hits = svc
            .search_contracts(
                &globex.company_id,
                &ContractSearch {
                    text: Some("website".into()),
                    ..ContractSearch::default()
                },
                PageRequest::new(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(hits.total, 0);
    }

    #[tokio::test]
    async fn template_search_includes_system_templates() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let hits = svc
            .search_templates(
                &admin.company_id,
                &TemplateSearch {
                    text: Some("disclosure".into()),
                    ..TemplateSearch::default()
                },
                PageRequest::new(1, 10),
            )
            .await
            .unwrap();
        assert_eq!(hits.total, 1);
        assert!(hits.items[0].company_id.is_none());
    }
}
