//! Service layer orchestrating database mutations with the audit trail.
//!
//! `PactoriaService` wraps `PactoriaDb`. All repo methods are implemented as
//! `impl PactoriaService` blocks under `repos/`.

use chrono::Utc;
use serde::Serialize;

use pactoria_core::entities::AuditEntry;
use pactoria_core::enums::{AuditAction, EntityType};
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::PREFIX_AUDIT;

use crate::PactoriaDb;
use crate::error::DatabaseError;

/// `detail` argument for audit entries that carry none.
pub(crate) const NO_DETAIL: Option<&serde_json::Value> = None;

/// Who performed a mutation, as recorded in the audit trail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actor<'a> {
    pub company_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

impl<'a> Actor<'a> {
    /// Background jobs and system-template seeding.
    #[must_use]
    pub const fn system() -> Self {
        Self {
            company_id: None,
            user_id: None,
        }
    }

    /// A company-scoped mutation with no user behind it (e.g. the expiry job).
    #[must_use]
    pub const fn company(company_id: &'a str) -> Self {
        Self {
            company_id: Some(company_id),
            user_id: None,
        }
    }
}

impl<'a> From<&'a AuthIdentity> for Actor<'a> {
    fn from(identity: &'a AuthIdentity) -> Self {
        Self {
            company_id: Some(&identity.company_id),
            user_id: Some(&identity.user_id),
        }
    }
}

tokio::task_local! {
    /// Set while the current task is inside [`PactoriaService::write`].
    static IN_WRITE: ();
}

/// Orchestrates database mutations with the audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Take [`PactoriaDb::write_lock`] and begin a transaction
/// 2. Validate input and tenant ownership
/// 3. Execute SQL
/// 4. Append an audit entry (inside the transaction)
/// 5. Commit, or roll back on any error
///
/// Mutations called from inside another mutation join the outer
/// transaction.
pub struct PactoriaService {
    db: PactoriaDb,
}

impl PactoriaService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = PactoriaDb::open_local(db_path).await?;
        Ok(Self { db })
    }

    /// Create from an existing `PactoriaDb`.
    #[must_use]
    pub const fn from_db(db: PactoriaDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &PactoriaDb {
        &self.db
    }

    /// Liveness probe used by the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database does not answer.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        self.db.ping().await
    }

    /// Run `op` as one atomic write.
    ///
    /// All writes share the one connection, so every mutation goes through
    /// here: the write lock keeps other writes out of an open transaction,
    /// and a nested call reuses the transaction its caller already holds.
    pub(crate) async fn write<T, F>(&self, op: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        if IN_WRITE.try_with(|_| ()).is_ok() {
            return op.await;
        }
        let _guard = self.db.write_lock().await;
        let tx = self.db.conn().transaction().await?;
        match IN_WRITE.scope((), op).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(%rollback, "rollback failed");
                }
                Err(error)
            }
        }
    }

    /// Append an audit entry for a mutation just performed.
    pub(crate) async fn record<D: Serialize + ?Sized>(
        &self,
        actor: Actor<'_>,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<&D>,
    ) -> Result<AuditEntry, DatabaseError> {
        let detail = detail
            .map(serde_json::to_value)
            .transpose()
            .map_err(DatabaseError::json)?;
        let entry = AuditEntry {
            id: self.db.generate_id(PREFIX_AUDIT).await?,
            company_id: actor.company_id.map(String::from),
            user_id: actor.user_id.map(String::from),
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            detail,
            created_at: Utc::now(),
        };
        self.append_audit(&entry).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{new_contract, register_company, test_service};
    use crate::updates::contract::ContractUpdateBuilder;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn failed_write_rolls_back_nested_mutations() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let contract = svc.create_contract(&admin, new_contract("Lease")).await.unwrap();

        let result: Result<(), DatabaseError> = svc
            .write(async {
                svc.update_contract(
                    &admin,
                    &contract.id,
                    ContractUpdateBuilder::new()
                        .final_content(Some("Signed text".into()))
                        .build(),
                )
                .await?;
                Err(DatabaseError::business_rule("later step failed"))
            })
            .await;
        assert!(result.is_err());

        let reloaded = svc.get_contract(&admin.company_id, &contract.id).await.unwrap();
        assert_eq!(reloaded.final_content, None);
        assert_eq!(reloaded.version, 1);
        assert!(svc.list_versions(&admin.company_id, &contract.id).await.unwrap().is_empty());

        let updates = svc
            .query_audit(&AuditFilter {
                entity_id: Some(contract.id.clone()),
                action: Some(AuditAction::Updated),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert!(updates.is_empty(), "rolled-back edit left an audit entry");
    }

    #[tokio::test]
    async fn successful_write_commits_mutation_and_audit() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let contract = svc
            .write(async { svc.create_contract(&admin, new_contract("Lease")).await })
            .await
            .unwrap();

        assert_eq!(
            svc.get_contract(&admin.company_id, &contract.id).await.unwrap().title,
            "Lease"
        );
        let created = svc
            .query_audit(&AuditFilter {
                entity_id: Some(contract.id.clone()),
                action: Some(AuditAction::Created),
                ..AuditFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
    }
}
