//! Contract wizard sessions. A session belongs to the user who started it.

use chrono::Utc;

use pactoria_core::entities::{Contract, WizardData, WizardSession};
use pactoria_core::enums::{AuditAction, EntityType, WizardStatus};
use pactoria_core::errors::CoreError;
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::PREFIX_WIZARD;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_u32, parse_datetime, parse_enum, parse_json, to_json};
use crate::service::{NO_DETAIL, PactoriaService};

const SELECT_COLS: &str =
    "id, company_id, user_id, current_step, status, data, contract_id, created_at, updated_at";

fn row_to_wizard(row: &libsql::Row) -> Result<WizardSession, DatabaseError> {
    Ok(WizardSession {
        id: row.get(0)?,
        company_id: row.get(1)?,
        user_id: row.get(2)?,
        current_step: u8::try_from(get_u32(row, 3)?).unwrap_or(1),
        status: parse_enum(&row.get::<String>(4)?)?,
        data: parse_json(&row.get::<String>(5)?)?,
        contract_id: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl PactoriaService {
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn start_wizard(&self, actor: &AuthIdentity) -> Result<WizardSession, DatabaseError> {
        self.write(async {
            let now = Utc::now();
            let session = WizardSession {
                id: self.db().generate_id(PREFIX_WIZARD).await?,
                company_id: actor.company_id.clone(),
                user_id: actor.user_id.clone(),
                current_step: 1,
                status: WizardStatus::InProgress,
                data: WizardData::default(),
                contract_id: None,
                created_at: now,
                updated_at: now,
            };
            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO wizard_sessions ({SELECT_COLS})
                         VALUES (?1, ?2, ?3, 1, ?4, ?5, NULL, ?6, ?7)"
                    ),
                    libsql::params![
                        session.id.as_str(),
                        session.company_id.as_str(),
                        session.user_id.as_str(),
                        session.status.as_str(),
                        to_json(&session.data)?,
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await?;
            self.record(actor.into(), EntityType::Wizard, &session.id, AuditAction::Created, NO_DETAIL)
                .await?;
            Ok(session)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error unless the actor started the session.
    pub async fn get_wizard(&self, actor: &AuthIdentity, id: &str) -> Result<WizardSession, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM wizard_sessions
                     WHERE id = ?1 AND company_id = ?2 AND user_id = ?3"
                ),
                [id, actor.company_id.as_str(), actor.user_id.as_str()],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("wizard session", id))?;
        row_to_wizard(&row)
    }

    async fn persist_wizard(&self, session: &WizardSession) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE wizard_sessions
                 SET current_step = ?1, status = ?2, data = ?3, contract_id = ?4, updated_at = ?5
                 WHERE id = ?6",
                libsql::params![
                    i64::from(session.current_step),
                    session.status.as_str(),
                    to_json(&session.data)?,
                    session.contract_id.as_deref(),
                    session.updated_at.to_rfc3339(),
                    session.id.as_str()
                ],
            )
            .await?;
        Ok(())
    }

    /// Validate and store one step's payload.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed payload and `BusinessRule` for an
    /// out-of-order step or a finished session.
    pub async fn save_wizard_step(
        &self,
        actor: &AuthIdentity,
        id: &str,
        step: u8,
        payload: serde_json::Value,
    ) -> Result<WizardSession, DatabaseError> {
        self.write(async {
            let mut session = self.get_wizard(actor, id).await?;
            session.apply_step(step, payload)?;
            session.updated_at = Utc::now();
            self.persist_wizard(&session).await?;
            Ok(session)
        })
        .await
    }

    /// Create the contract from the collected steps and close the session,
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns `BusinessRule` when a step is missing or the session is no
    /// longer in progress.
    pub async fn complete_wizard(
        &self,
        actor: &AuthIdentity,
        id: &str,
    ) -> Result<(WizardSession, Contract), DatabaseError> {
        self.write(async {
            let mut session = self.get_wizard(actor, id).await?;
            if !session.status.can_transition_to(WizardStatus::Completed) {
                return Err(CoreError::invalid_transition(
                    "wizard session",
                    id,
                    session.status,
                    WizardStatus::Completed,
                )
                .into());
            }
            let input = session.to_new_contract()?;
            let contract = self.create_contract(actor, input).await?;
            session.status = WizardStatus::Completed;
            session.contract_id = Some(contract.id.clone());
            session.updated_at = Utc::now();
            self.persist_wizard(&session).await?;
            self.record(
                actor.into(),
                EntityType::Wizard,
                &session.id,
                AuditAction::StatusChanged,
                Some(&serde_json::json!({"to": WizardStatus::Completed, "contract_id": contract.id})),
            )
            .await?;
            Ok((session, contract))
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an `InvalidTransition` core error unless the session is in
    /// progress.
    pub async fn abandon_wizard(&self, actor: &AuthIdentity, id: &str) -> Result<WizardSession, DatabaseError> {
        self.write(async {
            let mut session = self.get_wizard(actor, id).await?;
            if !session.status.can_transition_to(WizardStatus::Abandoned) {
                return Err(CoreError::invalid_transition(
                    "wizard session",
                    id,
                    session.status,
                    WizardStatus::Abandoned,
                )
                .into());
            }
            session.status = WizardStatus::Abandoned;
            session.updated_at = Utc::now();
            self.persist_wizard(&session).await?;
            self.record(
                actor.into(),
                EntityType::Wizard,
                id,
                AuditAction::StatusChanged,
                Some(&serde_json::json!({"to": WizardStatus::Abandoned})),
            )
            .await?;
            Ok(session)
        })
        .await
    }
}
