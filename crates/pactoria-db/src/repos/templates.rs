//! Template repository.
//!
//! A company sees its own templates plus system templates (`company_id IS
//! NULL`). System templates are read-only for companies.

use chrono::Utc;

use pactoria_core::entities::{LegalTemplate, NewTemplate, TemplateVariable};
use pactoria_core::enums::{AuditAction, ContractType, EntityType, TemplateStatus};
use pactoria_core::errors::CoreError;
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::PREFIX_TEMPLATE;
use pactoria_core::pagination::{Page, PageRequest};

use crate::error::DatabaseError;
use crate::helpers::{
    get_count, get_opt_string, get_u32, parse_datetime, parse_enum, parse_json, sql_int, to_json,
};
use crate::service::{Actor, PactoriaService};
use crate::updates::SetList;
use crate::updates::template::TemplateUpdate;

pub(crate) const SELECT_COLS: &str = "id, company_id, name, category, description, content, \
     variables, status, version, jurisdiction, created_by, created_at, updated_at";

/// Rows visible to company `?1`.
pub(crate) const VISIBLE_TO_COMPANY: &str = "(company_id = ?1 OR company_id IS NULL)";

pub(crate) fn row_to_template(row: &libsql::Row) -> Result<LegalTemplate, DatabaseError> {
    Ok(LegalTemplate {
        id: row.get(0)?,
        company_id: get_opt_string(row, 1)?,
        name: row.get(2)?,
        category: parse_enum(&row.get::<String>(3)?)?,
        description: get_opt_string(row, 4)?,
        content: row.get(5)?,
        variables: parse_json::<Vec<TemplateVariable>>(&row.get::<String>(6)?)?,
        status: parse_enum(&row.get::<String>(7)?)?,
        version: get_u32(row, 8)?,
        jurisdiction: row.get(9)?,
        created_by: get_opt_string(row, 10)?,
        created_at: parse_datetime(&row.get::<String>(11)?)?,
        updated_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

/// Filters for `GET /templates`.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub category: Option<ContractType>,
    pub status: Option<TemplateStatus>,
}

impl PactoriaService {
    /// Create a draft template owned by the caller's company.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input or undeclared placeholders.
    pub async fn create_template(
        &self,
        actor: &AuthIdentity,
        input: NewTemplate,
    ) -> Result<LegalTemplate, DatabaseError> {
        self.write(async {
            self.insert_template(
                Some(actor.company_id.as_str()),
                Some(actor.user_id.as_str()),
                input,
                TemplateStatus::Draft,
            )
            .await
        })
        .await
    }

    /// Create an active template visible to every company.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input.
    pub async fn create_system_template(&self, input: NewTemplate) -> Result<LegalTemplate, DatabaseError> {
        self.write(async {
            self.insert_template(None, None, input, TemplateStatus::Active).await
        })
        .await
    }

    async fn insert_template(
        &self,
        company_id: Option<&str>,
        user_id: Option<&str>,
        input: NewTemplate,
        status: TemplateStatus,
    ) -> Result<LegalTemplate, DatabaseError> {
        let input = input.validate()?;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_TEMPLATE).await?;
        let template = LegalTemplate {
            id,
            company_id: company_id.map(String::from),
            name: input.name,
            category: input.category,
            description: input.description,
            content: input.content,
            variables: input.variables,
            status,
            version: 1,
            jurisdiction: input
                .jurisdiction
                .unwrap_or_else(|| pactoria_core::entities::DEFAULT_JURISDICTION.to_string()),
            created_by: user_id.map(String::from),
            created_at: now,
            updated_at: now,
        };

        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO templates ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                libsql::params![
                    template.id.as_str(),
                    template.company_id.as_deref(),
                    template.name.as_str(),
                    template.category.as_str(),
                    template.description.as_deref(),
                    template.content.as_str(),
                    to_json(&template.variables)?,
                    template.status.as_str(),
                    sql_int(template.version),
                    template.jurisdiction.as_str(),
                    template.created_by.as_deref(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        self.record(
            Actor { company_id, user_id },
            EntityType::Template,
            &template.id,
            AuditAction::Created,
            Some(&serde_json::json!({"name": template.name, "category": template.category})),
        )
        .await?;
        Ok(template)
    }

    /// A template owned by `company_id` or a system template.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` core error for unknown ids and other tenants'
    /// templates.
    pub async fn get_template(&self, company_id: &str, id: &str) -> Result<LegalTemplate, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM templates WHERE {VISIBLE_TO_COMPANY} AND id = ?2"),
                [company_id, id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("template", id))?;
        row_to_template(&row)
    }

    /// Own templates first, then system templates, each by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_templates(
        &self,
        company_id: &str,
        filter: &TemplateFilter,
        page: PageRequest,
    ) -> Result<Page<LegalTemplate>, DatabaseError> {
        let mut conditions = vec![VISIBLE_TO_COMPANY.to_string()];
        let mut params: Vec<libsql::Value> = vec![libsql::Value::Text(company_id.to_string())];
        if let Some(category) = filter.category {
            params.push(libsql::Value::Text(category.as_str().to_string()));
            conditions.push(format!("category = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }
        let where_clause = conditions.join(" AND ");

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM templates WHERE {where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total = get_count(&rows.next().await?.ok_or(DatabaseError::NoResult)?, 0)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM templates WHERE {where_clause}
                     ORDER BY company_id IS NULL, name COLLATE NOCASE LIMIT {} OFFSET {}",
                    page.size,
                    page.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_template(&row)?);
        }
        Ok(Page::new(items, total, page))
    }

    /// A template the caller's company owns (system templates are rejected).
    async fn get_owned_template(
        &self,
        actor: &AuthIdentity,
        id: &str,
    ) -> Result<LegalTemplate, DatabaseError> {
        let template = self.get_template(&actor.company_id, id).await?;
        if template.company_id.is_none() {
            return Err(DatabaseError::business_rule(format!(
                "system template {id} is read-only"
            )));
        }
        Ok(template)
    }

    /// Partially update a draft or in-review template. Content or variable
    /// changes bump `version`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input, a non-editable status,
    /// a system template, or placeholders left without a declared variable.
    pub async fn update_template(
        &self,
        actor: &AuthIdentity,
        id: &str,
        update: TemplateUpdate,
    ) -> Result<LegalTemplate, DatabaseError> {
        self.write(async {
            let update = update.validate()?;
            let current = self.get_owned_template(actor, id).await?;
            if !current.status.is_editable() {
                return Err(DatabaseError::business_rule(format!(
                    "template {id} is {} and can no longer be edited",
                    current.status
                )));
            }

            let mut sets = SetList::default();
            if let Some(ref name) = update.name {
                sets.push("name", name.clone());
            }
            if let Some(category) = update.category {
                sets.push("category", category.as_str());
            }
            if let Some(ref description) = update.description {
                sets.push("description", description.clone());
            }
            if let Some(ref jurisdiction) = update.jurisdiction {
                sets.push("jurisdiction", jurisdiction.clone());
            }
            if update.changes_body() {
                let merged = LegalTemplate {
                    content: update.content.clone().unwrap_or_else(|| current.content.clone()),
                    variables: update
                        .variables
                        .clone()
                        .unwrap_or_else(|| current.variables.clone()),
                    ..current.clone()
                };
                merged.validate_variables()?;
                if let Some(ref content) = update.content {
                    sets.push("content", content.clone());
                }
                if let Some(ref variables) = update.variables {
                    sets.push("variables", to_json(variables)?);
                }
                sets.push("version", sql_int(current.version + 1));
            }
            if sets.is_empty() {
                return Ok(current);
            }
            sets.push("updated_at", Utc::now().to_rfc3339());

            let (sql, params) = sets.into_update("templates", id);
            self.db()
                .conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;

            let updated = self.get_template(&actor.company_id, id).await?;
            self.record(actor.into(), EntityType::Template, id, AuditAction::Updated, Some(&update))
                .await?;
            Ok(updated)
        })
        .await
    }

    /// Move a company template through its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidTransition` core error when the state machine
    /// forbids the move.
    pub async fn transition_template(
        &self,
        actor: &AuthIdentity,
        id: &str,
        new_status: TemplateStatus,
    ) -> Result<LegalTemplate, DatabaseError> {
        self.write(async {
            let current = self.get_owned_template(actor, id).await?;
            if !current.status.can_transition_to(new_status) {
                return Err(CoreError::invalid_transition("template", id, current.status, new_status).into());
            }
            let now = Utc::now();
            self.db()
                .conn()
                .execute(
                    "UPDATE templates SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    libsql::params![new_status.as_str(), now.to_rfc3339(), id],
                )
                .await?;
            self.record(
                actor.into(),
                EntityType::Template,
                id,
                AuditAction::StatusChanged,
                Some(&serde_json::json!({"from": current.status, "to": new_status})),
            )
            .await?;
            Ok(LegalTemplate {
                status: new_status,
                updated_at: now,
                ..current
            })
        })
        .await
    }

    /// Delete a draft company template.
    ///
    /// # Errors
    ///
    /// Returns a business-rule error for system templates or non-draft status.
    pub async fn delete_template(&self, actor: &AuthIdentity, id: &str) -> Result<(), DatabaseError> {
        self.write(async {
            let current = self.get_owned_template(actor, id).await?;
            if current.status != TemplateStatus::Draft {
                return Err(DatabaseError::business_rule(format!(
                    "only draft templates can be deleted; {id} is {}",
                    current.status
                )));
            }
            self.db()
                .conn()
                .execute("DELETE FROM templates WHERE id = ?1", [id])
                .await?;
            self.record(
                actor.into(),
                EntityType::Template,
                id,
                AuditAction::Deleted,
                Some(&serde_json::json!({"name": current.name})),
            )
            .await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{register_company, test_service};
    use crate::updates::template::TemplateUpdateBuilder;
    use pactoria_core::enums::VariableType;
    use pretty_assertions::assert_eq;

    fn var(name: &str, required: bool) -> TemplateVariable {
        TemplateVariable {
            name: name.into(),
            label: name.into(),
            var_type: VariableType::Text,
            required,
            default_value: None,
            description: None,
        }
    }

    fn nda() -> NewTemplate {
        NewTemplate {
            name: "Short NDA".into(),
            category: ContractType::Nda,
            description: None,
            content: "Between {{party_a}} and {{party_b}}.".into(),
            variables: vec![var("party_a", true), var("party_b", true)],
            jurisdiction: None,
        }
    }

    #[tokio::test]
    async fn company_sees_own_and_system_templates() {
        let svc = test_service().await;
        let (_, acme) = register_company(&svc, "Acme").await;
        let (_, globex) = register_company(&svc, "Globex").await;

        let own = svc.create_template(&acme, nda()).await.unwrap();
        assert_eq!(own.status, TemplateStatus::Draft);
        assert_eq!(own.jurisdiction, "England and Wales");

        let acme_list = svc
            .list_templates(&acme.company_id, &TemplateFilter::default(), PageRequest::new(1, 50))
            .await
            .unwrap();
        let globex_list = svc
            .list_templates(&globex.company_id, &TemplateFilter::default(), PageRequest::new(1, 50))
            .await
            .unwrap();
        assert_eq!(acme_list.total, globex_list.total + 1);
        assert_eq!(acme_list.items[0].id, own.id);
        assert!(globex_list.items.iter().all(|t| t.company_id.is_none()));

        let err = svc.get_template(&globex.company_id, &own.id).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::NotFound { .. })));
        svc.get_template(&globex.company_id, "tpl-00000a01").await.unwrap();
    }

    #[tokio::test]
    async fn filters_by_category() {
        let svc = test_service().await;
        let (_, acme) = register_company(&svc, "Acme").await;
        let ndas = svc
            .list_templates(
                &acme.company_id,
                &TemplateFilter {
                    category: Some(ContractType::Nda),
                    status: Some(TemplateStatus::Active),
                },
                PageRequest::new(1, 20),
            )
            .await
            .unwrap();
        assert!(ndas.total >= 1);
        assert!(ndas.items.iter().all(|t| t.category == ContractType::Nda));
    }

    #[tokio::test]
    async fn body_update_bumps_version_and_checks_placeholders() {
        let svc = test_service().await;
        let (_, acme) = register_company(&svc, "Acme").await;
        let tpl = svc.create_template(&acme, nda()).await.unwrap();

        let updated = svc
            .update_template(
                &acme,
                &tpl.id,
                TemplateUpdateBuilder::new()
                    .content("{{party_a}} agrees with {{party_b}}.")
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.version, 2);

        let err = svc
            .update_template(
                &acme,
                &tpl.id,
                TemplateUpdateBuilder::new().content("{{party_c}} only").build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::Validation { .. })));

        let renamed = svc
            .update_template(&acme, &tpl.id, TemplateUpdateBuilder::new().name("Mutual NDA").build())
            .await
            .unwrap();
        assert_eq!(renamed.version, 2);
        assert_eq!(renamed.name, "Mutual NDA");
    }

    #[tokio::test]
    async fn lifecycle_and_delete_rules() {
        let svc = test_service().await;
        let (_, acme) = register_company(&svc, "Acme").await;
        let tpl = svc.create_template(&acme, nda()).await.unwrap();

        let err = svc
            .transition_template(&acme, &tpl.id, TemplateStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InvalidTransition { .. })));

        for status in [TemplateStatus::Review, TemplateStatus::Approved, TemplateStatus::Active] {
            svc.transition_template(&acme, &tpl.id, status).await.unwrap();
        }
        let err = svc.delete_template(&acme, &tpl.id).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));
        let err = svc
            .update_template(&acme, &tpl.id, TemplateUpdateBuilder::new().name("x").build())
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));

        let draft = svc.create_template(&acme, nda()).await.unwrap();
        svc.delete_template(&acme, &draft.id).await.unwrap();
        assert!(svc.get_template(&acme.company_id, &draft.id).await.is_err());
    }

    #[tokio::test]
    async fn system_templates_are_read_only() {
        let svc = test_service().await;
        let (_, acme) = register_company(&svc, "Acme").await;
        let system = svc.create_system_template(nda()).await.unwrap();
        assert!(system.company_id.is_none());
        assert!(system.is_usable());

        let err = svc.delete_template(&acme, &system.id).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));
    }
}
