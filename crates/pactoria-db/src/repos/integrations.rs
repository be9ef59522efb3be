//! Integration connection state per company and provider.
//!
//! Only the connection record is stored here; no provider API is called.

use chrono::{DateTime, Utc};

use pactoria_core::entities::IntegrationConnection;
use pactoria_core::enums::{AuditAction, EntityType, IntegrationProvider, IntegrationStatus};
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::PREFIX_INTEGRATION;
use pactoria_core::responses::IntegrationInfo;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_datetime, to_json};
use crate::service::{NO_DETAIL, PactoriaService};

const SELECT_COLS: &str = "id, company_id, provider, status, config, connected_by, connected_at, \
                           last_sync_at, created_at, updated_at";

fn row_to_connection(row: &libsql::Row) -> Result<IntegrationConnection, DatabaseError> {
    Ok(IntegrationConnection {
        id: row.get(0)?,
        company_id: row.get(1)?,
        provider: parse_enum(&row.get::<String>(2)?)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        config: parse_json(&row.get::<String>(4)?)?,
        connected_by: get_opt_string(row, 5)?,
        connected_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
        last_sync_at: parse_optional_datetime(get_opt_string(row, 7)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

impl PactoriaService {
    /// Stored connections for a company, in provider order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_connections(&self, company_id: &str) -> Result<Vec<IntegrationConnection>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM integrations WHERE company_id = ?1 ORDER BY provider"),
                [company_id],
            )
            .await?;
        let mut connections = Vec::new();
        while let Some(row) = rows.next().await? {
            connections.push(row_to_connection(&row)?);
        }
        Ok(connections)
    }

    /// The full provider catalog merged with the company's connection state.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn integration_catalog(&self, company_id: &str) -> Result<Vec<IntegrationInfo>, DatabaseError> {
        let connections = self.list_connections(company_id).await?;
        Ok(IntegrationProvider::ALL
            .iter()
            .map(|&provider| {
                IntegrationInfo::from_catalog(
                    provider,
                    connections.iter().find(|c| c.provider == provider),
                )
            })
            .collect())
    }

    async fn get_connection(
        &self,
        company_id: &str,
        provider: IntegrationProvider,
    ) -> Result<Option<IntegrationConnection>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM integrations WHERE company_id = ?1 AND provider = ?2"),
                [company_id, provider.as_str()],
            )
            .await?;
        rows.next().await?.map(|row| row_to_connection(&row)).transpose()
    }

    /// Mark a provider connected, creating the row on first connect.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the upsert fails.
    pub async fn connect_integration(
        &self,
        actor: &AuthIdentity,
        provider: IntegrationProvider,
        config: serde_json::Value,
    ) -> Result<IntegrationConnection, DatabaseError> {
        self.write(async {
            let now = Utc::now().to_rfc3339();
            let id = self.db().generate_id(PREFIX_INTEGRATION).await?;
            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO integrations ({SELECT_COLS})
                         VALUES (?1, ?2, ?3, 'connected', ?4, ?5, ?6, NULL, ?6, ?6)
                         ON CONFLICT(company_id, provider) DO UPDATE SET
                             status = 'connected', config = excluded.config,
                             connected_by = excluded.connected_by,
                             connected_at = excluded.connected_at,
                             updated_at = excluded.updated_at"
                    ),
                    libsql::params![
                        id,
                        actor.company_id.as_str(),
                        provider.as_str(),
                        to_json(&config)?,
                        actor.user_id.as_str(),
                        now
                    ],
                )
                .await?;

            let connection = self
                .get_connection(&actor.company_id, provider)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            self.record(
                actor.into(),
                EntityType::Integration,
                &connection.id,
                AuditAction::Connected,
                Some(&serde_json::json!({"provider": provider})),
            )
            .await?;
            tracing::info!(company_id = %actor.company_id, %provider, "integration connected");
            Ok(connection)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error when the provider was never
    /// connected.
    pub async fn disconnect_integration(
        &self,
        actor: &AuthIdentity,
        provider: IntegrationProvider,
    ) -> Result<IntegrationConnection, DatabaseError> {
        self.write(async {
            let current = self
                .get_connection(&actor.company_id, provider)
                .await?
                .ok_or_else(|| DatabaseError::not_found("integration", provider.as_str()))?;
            let now = Utc::now();
            self.db()
                .conn()
                .execute(
                    "UPDATE integrations SET status = 'disconnected', updated_at = ?1 WHERE id = ?2",
                    libsql::params![now.to_rfc3339(), current.id.as_str()],
                )
                .await?;
            self.record(
                actor.into(),
                EntityType::Integration,
                &current.id,
                AuditAction::Disconnected,
                Some(&serde_json::json!({"provider": provider})),
            )
            .await?;
            Ok(IntegrationConnection {
                status: IntegrationStatus::Disconnected,
                updated_at: now,
                ..current
            })
        })
        .await
    }

    /// Stamp `last_sync_at` on a connected provider.
    ///
    /// # Errors
    ///
    /// Returns a `BusinessRule` core error when the provider is not
    /// connected.
    pub async fn record_integration_sync(
        &self,
        actor: &AuthIdentity,
        provider: IntegrationProvider,
        at: DateTime<Utc>,
    ) -> Result<IntegrationConnection, DatabaseError> {
        self.write(async {
            let current = self.get_connection(&actor.company_id, provider).await?;
            let Some(current) = current.filter(IntegrationConnection::is_connected) else {
                return Err(DatabaseError::business_rule(format!(
                    "{} is not connected",
                    provider.display_name()
                )));
            };
            self.db()
                .conn()
                .execute(
                    "UPDATE integrations SET last_sync_at = ?1, updated_at = ?1 WHERE id = ?2",
                    libsql::params![at.to_rfc3339(), current.id.as_str()],
                )
                .await?;
            self.record(actor.into(), EntityType::Integration, &current.id, AuditAction::Updated, NO_DETAIL)
                .await?;
            Ok(IntegrationConnection {
                last_sync_at: Some(at),
                updated_at: at,
                ..current
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{register_company, test_service};
    use pactoria_core::errors::CoreError;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn connect_is_an_upsert() {
        let svc = test_service().await;
        let (company, admin) = register_company(&svc, "Acme").await;

        let first = svc
            .connect_integration(&admin, IntegrationProvider::Xero, serde_json::json!({"tenant": "a"}))
            .await
            .unwrap();
        assert!(first.is_connected());
        svc.disconnect_integration(&admin, IntegrationProvider::Xero).await.unwrap();
        let again = svc
            .connect_integration(&admin, IntegrationProvider::Xero, serde_json::json!({"tenant": "b"}))
            .await
            .unwrap();

        assert_eq!(again.id, first.id);
        assert_eq!(again.config["tenant"], "b");
        assert_eq!(svc.list_connections(&company.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn catalog_merges_state() {
        let svc = test_service().await;
        let (company, admin) = register_company(&svc, "Acme").await;
        svc.connect_integration(&admin, IntegrationProvider::Slack, serde_json::json!({}))
            .await
            .unwrap();

        let catalog = svc.integration_catalog(&company.id).await.unwrap();
        assert_eq!(catalog.len(), IntegrationProvider::ALL.len());
        let slack = catalog
            .iter()
            .find(|i| i.provider == IntegrationProvider::Slack)
            .unwrap();
        assert_eq!(slack.status, IntegrationStatus::Connected);
        assert!(
            catalog
                .iter()
                .filter(|i| i.provider != IntegrationProvider::Slack)
                .all(|i| i.status == IntegrationStatus::Disconnected)
        );
    }

    #[tokio::test]
    async fn sync_requires_connection() {
        let svc = test_service().await;
        let (_, admin) = register_company(&svc, "Acme").await;
        let err = svc
            .record_integration_sync(&admin, IntegrationProvider::Hubspot, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::BusinessRule(_))));

        let err = svc
            .disconnect_integration(&admin, IntegrationProvider::Hubspot)
            .await
            .unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::NotFound { .. })));

        svc.connect_integration(&admin, IntegrationProvider::Hubspot, serde_json::json!({}))
            .await
            .unwrap();
        let synced = svc
            .record_integration_sync(&admin, IntegrationProvider::Hubspot, Utc::now())
            .await
            .unwrap();
        assert!(synced.last_sync_at.is_some());
    }
}
