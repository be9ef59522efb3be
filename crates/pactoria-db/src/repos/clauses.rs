//! Clause library repository.

use chrono::Utc;

use pactoria_core::entities::{LegalClause, NewClause};
use pactoria_core::enums::{AuditAction, ClauseCategory, ClauseStatus, EntityType, RiskLevel};
use pactoria_core::errors::CoreError;
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::PREFIX_CLAUSE;
use pactoria_core::pagination::{Page, PageRequest};

use crate::error::DatabaseError;
use crate::helpers::{fts_query, get_bool, get_count, parse_datetime, parse_enum, parse_json, to_json};
use crate::service::PactoriaService;
use crate::updates::SetList;
use crate::updates::clause::ClauseUpdate;

const SELECT_COLS: &str = "id, company_id, title, category, content, risk_level, status, tags, \
                           is_mandatory, created_by, created_at, updated_at";

fn row_to_clause(row: &libsql::Row) -> Result<LegalClause, DatabaseError> {
    Ok(LegalClause {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        category: parse_enum(&row.get::<String>(3)?)?,
        content: row.get(4)?,
        risk_level: parse_enum(&row.get::<String>(5)?)?,
        status: parse_enum(&row.get::<String>(6)?)?,
        tags: parse_json(&row.get::<String>(7)?)?,
        is_mandatory: get_bool(row, 8)?,
        created_by: row.get(9)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

/// Filters for listing and searching the clause library.
#[derive(Debug, Clone, Default)]
pub struct ClauseFilter {
    pub text: Option<String>,
    pub category: Option<ClauseCategory>,
    pub risk_level: Option<RiskLevel>,
    pub status: Option<ClauseStatus>,
    pub tag: Option<String>,
}

impl PactoriaService {
    /// Add a draft clause to the caller's library.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input.
    pub async fn create_clause(
        &self,
        actor: &AuthIdentity,
        input: NewClause,
    ) -> Result<LegalClause, DatabaseError> {
        self.write(async {
            let input = input.validate()?;
            let now = Utc::now();
            let clause = LegalClause {
                id: self.db().generate_id(PREFIX_CLAUSE).await?,
                company_id: actor.company_id.clone(),
                title: input.title,
                category: input.category,
                content: input.content,
                risk_level: input.risk_level,
                status: ClauseStatus::Draft,
                tags: input.tags,
                is_mandatory: input.is_mandatory,
                created_by: actor.user_id.clone(),
                created_at: now,
                updated_at: now,
            };

            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO clauses ({SELECT_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                    ),
                    libsql::params![
                        clause.id.as_str(),
                        clause.company_id.as_str(),
                        clause.title.as_str(),
                        clause.category.as_str(),
                        clause.content.as_str(),
                        clause.risk_level.as_str(),
                        clause.status.as_str(),
                        to_json(&clause.tags)?,
                        i64::from(clause.is_mandatory),
                        clause.created_by.as_str(),
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await?;

            self.record(
                actor.into(),
                EntityType::Clause,
                &clause.id,
                AuditAction::Created,
                Some(&serde_json::json!({"title": clause.title, "category": clause.category})),
            )
            .await?;
            Ok(clause)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error for unknown ids and other tenants'
    /// clauses.
    pub async fn get_clause(&self, company_id: &str, id: &str) -> Result<LegalClause, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM clauses WHERE id = ?1 AND company_id = ?2"),
                [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("clause", id))?;
        row_to_clause(&row)
    }

    /// Filtered page of the clause library. A text filter matches the FTS5
    /// index over title, content, and tags.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_clauses(
        &self,
        company_id: &str,
        filter: &ClauseFilter,
        page: PageRequest,
    ) -> Result<Page<LegalClause>, DatabaseError> {
        let mut conditions = vec!["company_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![libsql::Value::Text(company_id.to_string())];

        if let Some(query) = filter.text.as_deref().and_then(fts_query) {
            params.push(libsql::Value::Text(query));
            conditions.push(format!(
                "rowid IN (SELECT rowid FROM clauses_fts WHERE clauses_fts MATCH ?{})",
                params.len()
            ));
        }
        if let Some(category) = filter.category {
            params.push(libsql::Value::Text(category.as_str().to_string()));
            conditions.push(format!("category = ?{}", params.len()));
        }
        if let Some(risk) = filter.risk_level {
            params.push(libsql::Value::Text(risk.as_str().to_string()));
            conditions.push(format!("risk_level = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(libsql::Value::Text(status.as_str().to_string()));
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(tag) = filter.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(libsql::Value::Text(tag.to_lowercase()));
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM json_each(clauses.tags) WHERE value = ?{})",
                params.len()
            ));
        }
        let where_clause = conditions.join(" AND ");

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM clauses WHERE {where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let total = get_count(&rows.next().await?.ok_or(DatabaseError::NoResult)?, 0)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM clauses WHERE {where_clause}
                     ORDER BY category, title COLLATE NOCASE LIMIT {} OFFSET {}",
                    page.size,
                    page.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_clause(&row)?);
        }
        Ok(Page::new(items, total, page))
    }

    /// Partially update a clause that is not deprecated.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input or a deprecated clause.
    pub async fn update_clause(
        &self,
        actor: &AuthIdentity,
        id: &str,
        update: ClauseUpdate,
    ) -> Result<LegalClause, DatabaseError> {
        self.write(async {
            let update = update.validate()?;
            let current = self.get_clause(&actor.company_id, id).await?;
            if current.status == ClauseStatus::Deprecated {
                return Err(DatabaseError::business_rule(format!(
                    "clause {id} is deprecated and can no longer be edited"
                )));
            }

            let mut sets = SetList::default();
            if let Some(ref title) = update.title {
                sets.push("title", title.clone());
            }
            if let Some(category) = update.category {
                sets.push("category", category.as_str());
            }
            if let Some(ref content) = update.content {
                sets.push("content", content.clone());
            }
            if let Some(risk) = update.risk_level {
                sets.push("risk_level", risk.as_str());
            }
            if let Some(ref tags) = update.tags {
                sets.push("tags", to_json(tags)?);
            }
            if let Some(mandatory) = update.is_mandatory {
                sets.push("is_mandatory", i64::from(mandatory));
            }
            if sets.is_empty() {
                return Ok(current);
            }
            sets.push("updated_at", Utc::now().to_rfc3339());

            let (sql, params) = sets.into_update("clauses", id);
            self.db()
                .conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;

            let updated = self.get_clause(&actor.company_id, id).await?;
            self.record(actor.into(), EntityType::Clause, id, AuditAction::Updated, Some(&update))
                .await?;
            Ok(updated)
        })
        .await
    }

    /// Move a clause through `draft -> approved -> deprecated`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidTransition` core error when the state machine
    /// forbids the move.
    pub async fn transition_clause(
        &self,
        actor: &AuthIdentity,
        id: &str,
        new_status: ClauseStatus,
    ) -> Result<LegalClause, DatabaseError> {
        self.write(async {
            let current = self.get_clause(&actor.company_id, id).await?;
            if !current.status.can_transition_to(new_status) {
                return Err(CoreError::invalid_transition("clause", id, current.status, new_status).into());
            }
            let now = Utc::now();
            self.db()
                .conn()
                .execute(
                    "UPDATE clauses SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    libsql::params![new_status.as_str(), now.to_rfc3339(), id],
                )
                .await?;
            self.record(
                actor.into(),
                EntityType::Clause,
                id,
                AuditAction::StatusChanged,
                Some(&serde_json::json!({"from": current.status, "to": new_status})),
            )
            .await?;
            Ok(LegalClause {
                status: new_status,
                updated_at: now,
                ..current
            })
        })
        .await
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error for unknown ids and other tenants'
    /// clauses.
    pub async fn delete_clause(&self, actor: &AuthIdentity, id: &str) -> Result<(), DatabaseError> {
        self.write(async {
            let current = self.get_clause(&actor.company_id, id).await?;
            self.db()
                .conn()
                .execute("DELETE FROM clauses WHERE id = ?1", [id])
                .await?;
            self.record(
                actor.into(),
                EntityType::Clause,
                id,
                AuditAction::Deleted,
                Some(&serde_json::json!({"title": current.title})),
            )
            .await?;
            Ok(())
        })
        .await
    }

    /// Approved clauses by id, in the order given; unknown or unapproved ids
    /// are skipped. Used to splice library clauses into generation prompts.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn approved_clauses(
        &self,
        company_id: &str,
        ids: &[String],
    ) -> Result<Vec<LegalClause>, DatabaseError> {
        let mut clauses = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_clause(company_id, id).await {
                Ok(c) if c.status == ClauseStatus::Approved => clauses.push(c),
                Ok(_) | Err(DatabaseError::Core(CoreError::NotFound { .. })) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{register_company, test_service};
    use crate::updates::clause::ClauseUpdateBuilder;
    use pretty_assertions::assert_eq;

    fn clause(title: &str, category: ClauseCategory, content: &str, tags: &[&str]) -> NewClause {
        NewClause {
            title: title.into(),
            category,
            content: content.into(),
            risk_level: RiskLevel::Medium,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            is_mandatory: false,
        }
    }

    #[tokio::test]
    async fn create_filter_and_search() {
        let svc = test_service().await;
        let (_, acme) = register_company(&svc, "Acme").await;
        svc.create_clause(
            &acme,
            clause(
                "Limitation of liability",
                ClauseCategory::Liability,
                "Total liability is capped at fees paid.",
                &["Cap", "liability"],
            ),
        )
        .await
        .unwrap();
        svc.create_clause(
            &acme,
            clause(
                "Data processing",
                ClauseCategory::DataProtection,
                "Each party complies with UK GDPR.",
                &["gdpr"],
            ),
        )
        .await
        .unwrap();

        let all = svc
            .list_clauses(&acme.company_id, &ClauseFilter::default(), PageRequest::new(1, 20))
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let by_text = svc
            .list_clauses(
                &acme.company_id,
                &ClauseFilter {
                    text: Some("gdpr".into()),
                    ..ClauseFilter::default()
                },
                PageRequest::new(1, 20),
            )
            .await
            .unwrap();
        assert_eq!(by_text.total, 1);
        assert_eq!(by_text.items[0].title, "Data processing");

        let by_tag = svc
            .list_clauses(
                &acme.company_id,
                &ClauseFilter {
                    tag: Some("CAP".into()),
                    ..ClauseFilter::default()
                },
                PageRequest::new(1, 20),
            )
            .await
            .unwrap();
        assert_eq!(by_tag.total, 1);
        assert_eq!(by_tag.items[0].tags, vec!["cap".to_string(), "liability".to_string()]);
    }

    #[tokio::test]
    async fn lifecycle_update_and_delete() {
        let svc = test_service().await;
        let (_, acme) = register_company(&svc, "Acme").await;
        let (_, globex) = register_company(&svc, "Globex").await;
        let c = svc
            .create_clause(&acme, clause("Termination", ClauseCategory::Termination, "30 days notice.", &[]))
            .await
            .unwrap();

        assert!(svc.get_clause(&globex.company_id, &c.id).await.is_err());

        let updated = svc
            .update_clause(&acme, &c.id, ClauseUpdateBuilder::new().is_mandatory(true).build())
            .await
            .unwrap();
        assert!(updated.is_mandatory);

        let approved = svc
            .transition_clause(&acme, &c.id, ClauseStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, ClauseStatus::Approved);
        let picked = svc
            .approved_clauses(&acme.company_id, &[c.id.clone(), "cls-deadbeef".into()])
            .await
            .unwrap();
        assert_eq!(picked.len(), 1);

        svc.transition_clause(&acme, &c.id, ClauseStatus::Deprecated).await.unwrap();
        let err = svc
            .update_clause(&acme, &c.id, ClauseUpdateBuilder::new().title("x").build())
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));
        let err = svc
            .transition_clause(&acme, &c.id, ClauseStatus::Draft)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::InvalidTransition { .. })));

        svc.delete_clause(&acme, &c.id).await.unwrap();
        assert!(svc.get_clause(&acme.company_id, &c.id).await.is_err());
    }
}
