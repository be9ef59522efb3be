//! Contract repository: CRUD, versioning, status transitions, AI results,
//! and the expiry queries used by the background job.
//!
//! Every lookup is scoped by `company_id`; a contract owned by another
//! company is reported as not found.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use pactoria_core::entities::{Contract, ContractVersion, NewContract};
use pactoria_core::enums::{AuditAction, ContractStatus, ContractType, EntityType};
use pactoria_core::errors::CoreError;
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::{PREFIX_CONTRACT, PREFIX_CONTRACT_VERSION};
use pactoria_core::pagination::{Page, PageRequest};
use pactoria_core::validation;

use crate::error::DatabaseError;
use crate::helpers::{
    format_date, get_count, get_opt_f64, get_opt_string, get_u32, opt_date, opt_real, opt_text,
    parse_datetime, parse_enum, parse_optional_date, sql_int,
};
use crate::service::{Actor, PactoriaService};
use crate::updates::SetList;
use crate::updates::contract::ContractUpdate;

pub(crate) const SELECT_COLS: &str = "id, company_id, template_id, title, contract_type, status, \
     plain_english_input, client_name, client_email, supplier_name, contract_value, currency, \
     start_date, end_date, generated_content, final_content, compliance_score, risk_score, \
     ai_model, version, created_by, created_at, updated_at";

pub(crate) fn row_to_contract(row: &libsql::Row) -> Result<Contract, DatabaseError> {
    Ok(Contract {
        id: row.get(0)?,
        company_id: row.get(1)?,
        template_id: get_opt_string(row, 2)?,
        title: row.get(3)?,
        contract_type: parse_enum(&row.get::<String>(4)?)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        plain_english_input: get_opt_string(row, 6)?,
        client_name: get_opt_string(row, 7)?,
        client_email: get_opt_string(row, 8)?,
        supplier_name: get_opt_string(row, 9)?,
        contract_value: get_opt_f64(row, 10)?,
        currency: row.get(11)?,
        start_date: parse_optional_date(get_opt_string(row, 12)?.as_deref())?,
        end_date: parse_optional_date(get_opt_string(row, 13)?.as_deref())?,
        generated_content: get_opt_string(row, 14)?,
        final_content: get_opt_string(row, 15)?,
        compliance_score: get_opt_f64(row, 16)?,
        risk_score: get_opt_f64(row, 17)?,
        ai_model: get_opt_string(row, 18)?,
        version: get_u32(row, 19)?,
        created_by: row.get(20)?,
        created_at: parse_datetime(&row.get::<String>(21)?)?,
        updated_at: parse_datetime(&row.get::<String>(22)?)?,
    })
}

fn row_to_version(row: &libsql::Row) -> Result<ContractVersion, DatabaseError> {
    Ok(ContractVersion {
        id: row.get(0)?,
        contract_id: row.get(1)?,
        version: get_u32(row, 2)?,
        content: row.get(3)?,
        change_summary: get_opt_string(row, 4)?,
        created_by: row.get(5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Filters for `GET /contracts`.
#[derive(Debug, Clone, Default)]
pub struct ContractListFilter {
    pub status: Option<ContractStatus>,
    pub contract_type: Option<ContractType>,
}

/// AI-generated draft to store on a contract.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedContent {
    pub content: String,
    pub model: String,
    pub compliance_score: Option<f64>,
    pub risk_score: Option<f64>,
}

#[derive(Serialize)]
struct StatusChange {
    from: ContractStatus,
    to: ContractStatus,
}

fn check_scores(compliance: Option<f64>, risk: Option<f64>) -> Result<(), CoreError> {
    if let Some(score) = compliance {
        validation::unit_score("compliance_score", score)?;
    }
    if let Some(score) = risk {
        validation::risk_score(score)?;
    }
    Ok(())
}

impl PactoriaService {
    /// Create a draft contract at version 1.
    ///
    /// A referenced template must be visible to the company and active.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input or an unusable template.
    pub async fn create_contract(
        &self,
        actor: &AuthIdentity,
        input: NewContract,
    ) -> Result<Contract, DatabaseError> {
        self.write(async {
            let input = input.validate()?;
            if let Some(ref template_id) = input.template_id {
                let template = self.get_template(&actor.company_id, template_id).await?;
                if !template.is_usable() {
                    return Err(DatabaseError::business_rule(format!(
                        "template {template_id} is {} and cannot be used",
                        template.status
                    )));
                }
            }

            let now = Utc::now();
            let id = self.db().generate_id(PREFIX_CONTRACT).await?;
            let contract = Contract {
                id,
                company_id: actor.company_id.clone(),
                template_id: input.template_id,
                title: input.title,
                contract_type: input.contract_type,
                status: ContractStatus::Draft,
                plain_english_input: input.plain_english_input,
                client_name: input.client_name,
                client_email: input.client_email,
                supplier_name: input.supplier_name,
                contract_value: input.contract_value,
                currency: input
                    .currency
                    .unwrap_or_else(|| pactoria_core::entities::DEFAULT_CURRENCY.to_string()),
                start_date: input.start_date,
                end_date: input.end_date,
                generated_content: None,
                final_content: None,
                compliance_score: None,
                risk_score: None,
                ai_model: None,
                version: 1,
                created_by: actor.user_id.clone(),
                created_at: now,
                updated_at: now,
            };

            self.db()
                .conn()
                .execute(
                    "INSERT INTO contracts (id, company_id, template_id, title, contract_type, status,
                        plain_english_input, client_name, client_email, supplier_name, contract_value,
                        currency, start_date, end_date, version, created_by, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                    libsql::params![
                        contract.id.as_str(),
                        contract.company_id.as_str(),
                        opt_text(contract.template_id.as_deref()),
                        contract.title.as_str(),
                        contract.contract_type.as_str(),
                        contract.status.as_str(),
                        opt_text(contract.plain_english_input.as_deref()),
                        opt_text(contract.client_name.as_deref()),
                        opt_text(contract.client_email.as_deref()),
                        opt_text(contract.supplier_name.as_deref()),
                        opt_real(contract.contract_value),
                        contract.currency.as_str(),
                        opt_date(contract.start_date),
                        opt_date(contract.end_date),
                        sql_int(contract.version),
                        contract.created_by.as_str(),
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await?;

            self.record(
                actor.into(),
                EntityType::Contract,
                &contract.id,
                AuditAction::Created,
                Some(&serde_json::json!({
                    "title": contract.title,
                    "contract_type": contract.contract_type,
                })),
            )
            .await?;

            tracing::debug!(contract_id = %contract.id, "contract created");
            Ok(contract)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error for unknown ids and other tenants'
    /// contracts.
    pub async fn get_contract(&self, company_id: &str, id: &str) -> Result<Contract, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM contracts WHERE id = ?1 AND company_id = ?2"),
                [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("contract", id))?;
        row_to_contract(&row)
    }

    /// Newest first, one page.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_contracts(
        &self,
        company_id: &str,
        filter: &ContractListFilter,
        page: PageRequest,
    ) -> Result<Page<Contract>, DatabaseError> {
        let mut conditions = vec!["company_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![libsql::Value::Text(company_id.to_string())];
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(contract_type) = filter.contract_type {
            params.push(libsql::Value::Text(contract_type.as_str().to_string()));
            conditions.push(format!("contract_type = ?{}", params.len()));
        }
        let where_clause = conditions.join(" AND ");

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM contracts WHERE {where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total = get_count(&rows.next().await?.ok_or(DatabaseError::NoResult)?, 0)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM contracts WHERE {where_clause}
                     ORDER BY created_at DESC, rowid DESC LIMIT {} OFFSET {}",
                    page.size,
                    page.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_contract(&row)?);
        }
        Ok(Page::new(items, total, page))
    }

    /// Partially update a draft or in-review contract.
    ///
    /// A change to `final_content` records a [`ContractVersion`].
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input, a non-editable status,
    /// or an end date not after the start date.
    pub async fn update_contract(
        &self,
        actor: &AuthIdentity,
        id: &str,
        update: ContractUpdate,
    ) -> Result<Contract, DatabaseError> {
        self.write(async {
            let update = update.validate()?;
            let current = self.get_contract(&actor.company_id, id).await?;
            if update.is_empty() {
                return Ok(current);
            }
            if !current.status.is_editable() {
                return Err(DatabaseError::business_rule(format!(
                    "contract {id} is {} and can no longer be edited",
                    current.status
                )));
            }

            let start = update.start_date.unwrap_or(current.start_date);
            let end = update.end_date.unwrap_or(current.end_date);
            validation::date_range(start, end)?;

            let mut sets = SetList::default();
            if let Some(ref title) = update.title {
                sets.push("title", title.clone());
            }
            if let Some(contract_type) = update.contract_type {
                sets.push("contract_type", contract_type.as_str());
            }
            if let Some(ref input) = update.plain_english_input {
                sets.push("plain_english_input", opt_text(input.as_deref()));
            }
            if let Some(ref name) = update.client_name {
                sets.push("client_name", opt_text(name.as_deref()));
            }
            if let Some(ref email) = update.client_email {
                sets.push("client_email", opt_text(email.as_deref()));
            }
            if let Some(ref name) = update.supplier_name {
                sets.push("supplier_name", opt_text(name.as_deref()));
            }
            if let Some(value) = update.contract_value {
                sets.push("contract_value", opt_real(value));
            }
            if let Some(ref currency) = update.currency {
                sets.push("currency", currency.clone());
            }
            if let Some(date) = update.start_date {
                sets.push("start_date", opt_date(date));
            }
            if let Some(date) = update.end_date {
                sets.push("end_date", opt_date(date));
            }
            if let Some(ref content) = update.final_content {
                sets.push("final_content", opt_text(content.as_deref()));
                if let Some(text) = content.as_deref() {
                    if current.content() != Some(text) {
                        let version = self
                            .record_content_version(actor, &current, text, update.change_summary.as_deref())
                            .await?;
                        sets.push("version", sql_int(version));
                    }
                }
            }
            sets.push("updated_at", Utc::now().to_rfc3339());

            let (sql, params) = sets.into_update("contracts", id);
            self.db()
                .conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;

            let updated = self.get_contract(&actor.company_id, id).await?;
            self.record(actor.into(), EntityType::Contract, id, AuditAction::Updated, Some(&update))
                .await?;
            Ok(updated)
        })
        .await
    }

    /// Insert a version row for new content and return the contract's new
    /// version number. The first content a contract receives is version 1.
    async fn record_content_version(
        &self,
        actor: &AuthIdentity,
        current: &Contract,
        content: &str,
        change_summary: Option<&str>,
    ) -> Result<u32, DatabaseError> {
        let has_history = !self
            .list_versions(&actor.company_id, &current.id)
            .await?
            .is_empty();
        let version = if has_history {
            current.version + 1
        } else {
            current.version
        };
        let id = self.db().generate_id(PREFIX_CONTRACT_VERSION).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO contract_versions (id, contract_id, version, content, change_summary, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    current.id.as_str(),
                    sql_int(version),
                    content,
                    opt_text(change_summary),
                    actor.user_id.as_str(),
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(version)
    }

    /// Content history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` core error when the contract is not visible.
    pub async fn list_versions(
        &self,
        company_id: &str,
        contract_id: &str,
    ) -> Result<Vec<ContractVersion>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT v.id, v.contract_id, v.version, v.content, v.change_summary, v.created_by, v.created_at
                 FROM contract_versions v JOIN contracts c ON c.id = v.contract_id
                 WHERE v.contract_id = ?1 AND c.company_id = ?2
                 ORDER BY v.version",
                [contract_id, company_id],
            )
            .await?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next().await? {
            versions.push(row_to_version(&row)?);
        }
        if versions.is_empty() {
            // Distinguish "no history yet" from "not yours".
            self.get_contract(company_id, contract_id).await?;
        }
        Ok(versions)
    }

    /// Delete a draft or terminated contract.
    ///
    /// # Errors
    ///
    /// Returns a business-rule error for any other status.
    pub async fn delete_contract(&self, actor: &AuthIdentity, id: &str) -> Result<(), DatabaseError> {
        self.write(async {
            let current = self.get_contract(&actor.company_id, id).await?;
            if !matches!(current.status, ContractStatus::Draft | ContractStatus::Terminated) {
                return Err(DatabaseError::business_rule(format!(
                    "only draft or terminated contracts can be deleted; {id} is {}",
                    current.status
                )));
            }
            self.db()
                .conn()
                .execute(
                    "DELETE FROM contracts WHERE id = ?1 AND company_id = ?2",
                    [id, actor.company_id.as_str()],
                )
                .await?;
            self.record(
                actor.into(),
                EntityType::Contract,
                id,
                AuditAction::Deleted,
                Some(&serde_json::json!({"title": current.title})),
            )
            .await?;
            Ok(())
        })
        .await
    }

    /// Move a contract through its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidTransition` core error when the state machine
    /// forbids the move.
    pub async fn transition_contract(
        &self,
        actor: &AuthIdentity,
        id: &str,
        new_status: ContractStatus,
    ) -> Result<Contract, DatabaseError> {
        self.write(async {
            let current = self.get_contract(&actor.company_id, id).await?;
            self.apply_contract_status(actor.into(), &current, new_status).await
        })
        .await
    }

    async fn apply_contract_status(
        &self,
        actor: Actor<'_>,
        current: &Contract,
        new_status: ContractStatus,
    ) -> Result<Contract, DatabaseError> {
        if !current.status.can_transition_to(new_status) {
            return Err(CoreError::invalid_transition(
                "contract",
                &current.id,
                current.status,
                new_status,
            )
            .into());
        }

        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "UPDATE contracts SET status = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![new_status.as_str(), now.to_rfc3339(), current.id.as_str()],
            )
            .await?;

        let detail = StatusChange {
            from: current.status,
            to: new_status,
        };
        self.record(
            actor,
            EntityType::Contract,
            &current.id,
            AuditAction::StatusChanged,
            Some(&detail),
        )
        .await?;

        Ok(Contract {
            status: new_status,
            updated_at: now,
            ..current.clone()
        })
    }

    /// Store an AI draft as the contract's generated content.
    ///
    /// # Errors
    ///
    /// Returns a business-rule error when the contract is past review, or a
    /// validation error for out-of-range scores.
    pub async fn store_generation(
        &self,
        actor: &AuthIdentity,
        id: &str,
        generated: &GeneratedContent,
    ) -> Result<Contract, DatabaseError> {
        self.write(async {
            check_scores(generated.compliance_score, generated.risk_score)?;
            let current = self.get_contract(&actor.company_id, id).await?;
            if !current.status.is_editable() {
                return Err(DatabaseError::business_rule(format!(
                    "contract {id} is {} and cannot be regenerated",
                    current.status
                )));
            }

            let version = if current.final_content.is_none() {
                self.record_content_version(actor, &current, &generated.content, Some("AI generated draft"))
                    .await?
            } else {
                current.version
            };

            self.db()
                .conn()
                .execute(
                    "UPDATE contracts SET generated_content = ?1, ai_model = ?2, compliance_score = ?3,
                         risk_score = ?4, version = ?5, updated_at = ?6
                     WHERE id = ?7",
                    libsql::params![
                        generated.content.as_str(),
                        generated.model.as_str(),
                        opt_real(generated.compliance_score),
                        opt_real(generated.risk_score),
                        sql_int(version),
                        Utc::now().to_rfc3339(),
                        id
                    ],
                )
                .await?;

            self.record(
                actor.into(),
                EntityType::Contract,
                id,
                AuditAction::Generated,
                Some(&serde_json::json!({
                    "model": generated.model,
                    "compliance_score": generated.compliance_score,
                    "risk_score": generated.risk_score,
                })),
            )
            .await?;
            self.get_contract(&actor.company_id, id).await
        })
        .await
    }

    /// Store compliance and risk scores from an analysis run.
    ///
    /// # Errors
    ///
    /// Returns a validation error for out-of-range scores.
    pub async fn store_analysis(
        &self,
        actor: &AuthIdentity,
        id: &str,
        compliance_score: f64,
        risk_score: f64,
    ) -> Result<Contract, DatabaseError> {
        self.write(async {
            check_scores(Some(compliance_score), Some(risk_score))?;
            self.get_contract(&actor.company_id, id).await?;
            self.db()
                .conn()
                .execute(
                    "UPDATE contracts SET compliance_score = ?1, risk_score = ?2, updated_at = ?3 WHERE id = ?4",
                    libsql::params![compliance_score, risk_score, Utc::now().to_rfc3339(), id],
                )
                .await?;
            self.record(
                actor.into(),
                EntityType::Contract,
                id,
                AuditAction::Analyzed,
                Some(&serde_json::json!({
                    "compliance_score": compliance_score,
                    "risk_score": risk_score,
                })),
            )
            .await?;
            self.get_contract(&actor.company_id, id).await
        })
        .await
    }

    /// Active contracts (any company) ending within `days` of `today`,
    /// soonest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn expiring_within(
        &self,
        today: NaiveDate,
        days: u32,
    ) -> Result<Vec<Contract>, DatabaseError> {
        let horizon = today + Duration::days(i64::from(days));
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM contracts
                     WHERE status = 'active' AND end_date IS NOT NULL
                       AND end_date >= ?1 AND end_date <= ?2
                     ORDER BY end_date"
                ),
                [format_date(today), format_date(horizon)],
            )
            .await?;
        let mut contracts = Vec::new();
        while let Some(row) = rows.next().await? {
            contracts.push(row_to_contract(&row)?);
        }
        Ok(contracts)
    }

    /// Move active contracts whose end date is before `today` to `expired`.
    /// Returns the contracts that changed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn mark_expired(&self, today: NaiveDate) -> Result<Vec<Contract>, DatabaseError> {
        self.write(async {
            let mut rows = self
                .db()
                .conn()
                .query(
                    &format!(
                        "SELECT {SELECT_COLS} FROM contracts
                         WHERE status = 'active' AND end_date IS NOT NULL AND end_date < ?1"
                    ),
                    [format_date(today)],
                )
                .await?;
            let mut due = Vec::new();
            while let Some(row) = rows.next().await? {
                due.push(row_to_contract(&row)?);
            }

            let mut expired = Vec::with_capacity(due.len());
            for contract in due {
                let updated = self
                    .apply_contract_status(
                        Actor::company(&contract.company_id),
                        &contract,
                        ContractStatus::Expired,
                    )
                    .await?;
                expired.push(updated);
            }
            if !expired.is_empty() {
                tracing::info!(count = expired.len(), "contracts marked expired");
            }
            Ok(expired)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{new_contract, register_company, test_service};
    use crate::updates::contract::ContractUpdateBuilder;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn create_and_get() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;

        let contract = svc.create_contract(&admin, new_contract("Website build")).await.unwrap();
        assert!(contract.id.starts_with("ctr-"));
        assert_eq!(contract.status, ContractStatus::Draft);
        assert_eq!(contract.version, 1);
        assert_eq!(contract.currency, "GBP");

        let fetched = svc.get_contract(&admin.company_id, &contract.id).await.unwrap();
        assert_eq!(fetched, contract);
    }

    #[tokio::test]
    async fn other_company_cannot_see_contract() {
        let svc = test_service().await;
        let (_, acme) = register_company(&svc, "Acme").await;
        let (_, globex) = register_company(&svc, "Globex").await;

        let contract = svc.create_contract(&acme, new_contract("Secret deal")).await.unwrap();
        let err = svc.get_contract(&globex.company_id, &contract.id).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::NotFound { .. })));
        assert!(svc.delete_contract(&globex, &contract.id).await.is_err());
        assert!(svc.list_versions(&globex.company_id, &contract.id).await.is_err());
    }

    #[tokio::test]
    async fn list_is_paged_and_filtered() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        for i in 0..5 {
            svc.create_contract(&admin, new_contract(&format!("Contract {i}"))).await.unwrap();
        }
        let nda = NewContract {
            contract_type: ContractType::Nda,
            ..new_contract("NDA")
        };
        svc.create_contract(&admin, nda).await.unwrap();

        let page = svc
            .list_contracts(&admin.company_id, &ContractListFilter::default(), PageRequest::new(2, 4))
            .await
            .unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 2);

        let ndas = svc
            .list_contracts(
                &admin.company_id,
                &ContractListFilter {
                    contract_type: Some(ContractType::Nda),
                    ..ContractListFilter::default()
                },
                PageRequest::new(1, 20),
            )
            .await
            .unwrap();
        assert_eq!(ndas.total, 1);
        assert_eq!(ndas.items[0].title, "NDA");
    }

    #[tokio::test]
    async fn content_edits_create_versions() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let contract = svc.create_contract(&admin, new_contract("Lease")).await.unwrap();

        let v1 = svc
            .update_contract(
                &admin,
                &contract.id,
                ContractUpdateBuilder::new().final_content(Some("First text".into())).build(),
            )
            .await
            .unwrap();
        assert_eq!(v1.version, 1);

        let v2 = svc
            .update_contract(
                &admin,
                &contract.id,
                ContractUpdateBuilder::new()
                    .final_content(Some("Second text".into()))
                    .change_summary("tightened payment terms")
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(v2.version, 2);
        assert_eq!(v2.final_content.as_deref(), Some("Second text"));

        let versions = svc.list_versions(&admin.company_id, &contract.id).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].version, 2);
        assert_eq!(versions[1].change_summary.as_deref(), Some("tightened payment terms"));
    }

    #[tokio::test]
    async fn update_rejects_inverted_dates_against_stored_value() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let contract = svc
            .create_contract(
                &admin,
                NewContract {
                    start_date: Some(date(2025, 6, 1)),
                    ..new_contract("Lease")
                },
            )
            .await
            .unwrap();

        let err = svc
            .update_contract(
                &admin,
                &contract.id,
                ContractUpdateBuilder::new().end_date(Some(date(2025, 1, 1))).build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation { .. })));
    }

    #[tokio::test]
    async fn transitions_follow_state_machine() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let contract = svc.create_contract(&admin, new_contract("Supply")).await.unwrap();

        let err = svc
            .transition_contract(&admin, &contract.id, ContractStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InvalidTransition { .. })));

        for status in [ContractStatus::Review, ContractStatus::Approved, ContractStatus::Active] {
            let c = svc.transition_contract(&admin, &contract.id, status).await.unwrap();
            assert_eq!(c.status, status);
        }

        let err = svc
            .update_contract(&admin, &contract.id, ContractUpdateBuilder::new().title("x").build())
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));
        let err = svc.delete_contract(&admin, &contract.id).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));
    }

    #[tokio::test]
    async fn generation_and_analysis_are_stored() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let contract = svc.create_contract(&admin, new_contract("Consulting")).await.unwrap();

        let generated = svc
            .store_generation(
                &admin,
                &contract.id,
                &GeneratedContent {
                    content: "SERVICE AGREEMENT ...".into(),
                    model: "mock-1".into(),
                    compliance_score: Some(0.85),
                    risk_score: Some(3.0),
                },
            )
            .await
            .unwrap();
        assert_eq!(generated.ai_model.as_deref(), Some("mock-1"));
        assert_eq!(generated.content(), Some("SERVICE AGREEMENT ..."));
        assert_eq!(svc.list_versions(&admin.company_id, &contract.id).await.unwrap().len(), 1);

        let analyzed = svc.store_analysis(&admin, &contract.id, 0.5, 6.0).await.unwrap();
        assert_eq!(analyzed.compliance_score, Some(0.5));

        let err = svc.store_analysis(&admin, &contract.id, 1.5, 6.0).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation { .. })));
    }

    #[tokio::test]
    async fn expiry_queries() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let today = date(2025, 5, 1);

        let mut ids = Vec::new();
        for (title, end) in [("Past", date(2025, 4, 20)), ("Soon", date(2025, 5, 10)), ("Later", date(2025, 9, 1))] {
            let c = svc
                .create_contract(
                    &admin,
                    NewContract {
                        start_date: Some(date(2025, 1, 1)),
                        end_date: Some(end),
                        ..new_contract(title)
                    },
                )
                .await
                .unwrap();
            for status in [ContractStatus::Review, ContractStatus::Approved, ContractStatus::Active] {
                svc.transition_contract(&admin, &c.id, status).await.unwrap();
            }
            ids.push(c.id);
        }

        let soon = svc.expiring_within(today, 30).await.unwrap();
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].title, "Soon");

        let expired = svc.mark_expired(today).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, ids[0]);
        assert_eq!(
            svc.get_contract(&admin.company_id, &ids[0]).await.unwrap().status,
            ContractStatus::Expired
        );
        assert!(svc.mark_expired(today).await.unwrap().is_empty());
    }
}
