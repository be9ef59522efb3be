//! Audit trail repository.
//!
//! Append-only audit entries recording every mutation. Supports dynamic
//! filtering; entries are always scoped to a company when queried from the API.

use pactoria_core::entities::AuditEntry;
use pactoria_core::enums::{AuditAction, EntityType};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::PactoriaService;

const SELECT_COLS: &str = "id, company_id, user_id, entity_type, entity_id, action, detail, created_at";
const DEFAULT_LIMIT: u32 = 100;

/// Filter criteria for audit queries.
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub company_id: Option<String>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action: Option<AuditAction>,
    pub user_id: Option<String>,
    pub limit: Option<u32>,
}

pub(crate) fn row_to_audit(row: &libsql::Row) -> Result<AuditEntry, DatabaseError> {
    Ok(AuditEntry {
        id: row.get::<String>(0)?,
        company_id: get_opt_string(row, 1)?,
        user_id: get_opt_string(row, 2)?,
        entity_type: parse_enum(&row.get::<String>(3)?)?,
        entity_id: row.get::<String>(4)?,
        action: parse_enum(&row.get::<String>(5)?)?,
        detail: parse_optional_json(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl PactoriaService {
    /// Append an audit entry. Called by every mutation method.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the INSERT fails.
    pub async fn append_audit(&self, entry: &AuditEntry) -> Result<(), DatabaseError> {
        self.write(async {
            self.db()
                .conn()
                .execute(
                    &format!("INSERT INTO audit_trail ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                    libsql::params![
                        entry.id.as_str(),
                        entry.company_id.as_deref(),
                        entry.user_id.as_deref(),
                        entry.entity_type.as_str(),
                        entry.entity_id.as_str(),
                        entry.action.as_str(),
                        entry.detail.as_ref().map(std::string::ToString::to_string),
                        entry.created_at.to_rfc3339()
                    ],
                )
                .await?;
            Ok(())
        })
        .await
    }

    /// Query audit entries with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref cid) = filter.company_id {
            params.push(libsql::Value::Text(cid.clone()));
            conditions.push(format!("company_id = ?{}", params.len()));
        }
        if let Some(et) = filter.entity_type {
            params.push(libsql::Value::Text(et.as_str().to_string()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = filter.entity_id {
            params.push(libsql::Value::Text(eid.clone()));
            conditions.push(format!("entity_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref uid) = filter.user_id {
            params.push(libsql::Value::Text(uid.clone()));
            conditions.push(format!("user_id = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM audit_trail {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_audit(&row)?);
        }
        Ok(entries)
    }
}
