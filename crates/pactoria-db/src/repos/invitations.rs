//! Invitation repository: invite, accept, revoke, resend, expire.

use chrono::{DateTime, Duration, Utc};

use pactoria_core::entities::{Invitation, NewUser, User};
use pactoria_core::enums::{AuditAction, EntityType, InvitationStatus, UserRole};
use pactoria_core::errors::CoreError;
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::PREFIX_INVITATION;
use pactoria_core::validation;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_datetime};
use crate::service::{Actor, NO_DETAIL, PactoriaService};

const SELECT_COLS: &str = "id, company_id, email, role, token, status, invited_by, expires_at, \
                           accepted_at, created_at";

fn row_to_invitation(row: &libsql::Row) -> Result<Invitation, DatabaseError> {
    Ok(Invitation {
        id: row.get(0)?,
        company_id: row.get(1)?,
        email: row.get(2)?,
        role: parse_enum(&row.get::<String>(3)?)?,
        token: Some(row.get(4)?),
        status: parse_enum(&row.get::<String>(5)?)?,
        invited_by: row.get(6)?,
        expires_at: parse_datetime(&row.get::<String>(7)?)?,
        accepted_at: parse_optional_datetime(get_opt_string(row, 8)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

/// Input for inviting someone. The caller supplies the random token.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub email: String,
    pub role: UserRole,
    pub token: String,
    pub ttl_days: u32,
}

impl PactoriaService {
    /// Invite an email address into the actor's company.
    ///
    /// # Errors
    ///
    /// Returns a `BusinessRule` core error when no seat is free, the actor
    /// cannot grant the role, or the email is already a member or invited.
    pub async fn create_invitation(
        &self,
        actor: &AuthIdentity,
        input: NewInvitation,
    ) -> Result<Invitation, DatabaseError> {
        self.write(async {
            let email = validation::email("email", &input.email)?;
            if !actor.role.can_assign(input.role) {
                return Err(DatabaseError::business_rule(format!(
                    "a {} cannot invite someone as {}",
                    actor.role, input.role
                )));
            }
            if self.email_registered(&email).await? {
                return Err(DatabaseError::business_rule(format!(
                    "{email} already has an account"
                )));
            }
            if self.pending_invitation_for(&actor.company_id, &email).await?.is_some() {
                return Err(DatabaseError::business_rule(format!(
                    "{email} already has a pending invitation"
                )));
            }
            let usage = self.seat_usage(&actor.company_id).await?;
            if !usage.has_free_seat() {
                return Err(DatabaseError::business_rule(format!(
                    "all {} seats are in use; upgrade the subscription to invite more people",
                    usage.max_users
                )));
            }

            let now = Utc::now();
            let invitation = Invitation {
                id: self.db().generate_id(PREFIX_INVITATION).await?,
                company_id: actor.company_id.clone(),
                email,
                role: input.role,
                token: Some(input.token),
                status: InvitationStatus::Pending,
                invited_by: actor.user_id.clone(),
                expires_at: now + Duration::days(i64::from(input.ttl_days)),
                accepted_at: None,
                created_at: now,
            };

            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO invitations ({SELECT_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)"
                    ),
                    libsql::params![
                        invitation.id.as_str(),
                        invitation.company_id.as_str(),
                        invitation.email.as_str(),
                        invitation.role.as_str(),
                        invitation.token.as_deref(),
                        invitation.status.as_str(),
                        invitation.invited_by.as_str(),
                        invitation.expires_at.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await?;

            self.record(
                actor.into(),
                EntityType::Invitation,
                &invitation.id,
                AuditAction::Invited,
                Some(&serde_json::json!({"email": invitation.email, "role": invitation.role})),
            )
            .await?;
            tracing::info!(invitation_id = %invitation.id, "invitation created");
            Ok(invitation)
        })
        .await
    }

    async fn pending_invitation_for(
        &self,
        company_id: &str,
        email: &str,
    ) -> Result<Option<Invitation>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM invitations
                     WHERE company_id = ?1 AND email = ?2 AND status = 'pending'"
                ),
                [company_id, email],
            )
            .await?;
        rows.next().await?.map(|row| row_to_invitation(&row)).transpose()
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error for unknown ids and other tenants'
    /// invitations.
    pub async fn get_invitation(&self, company_id: &str, id: &str) -> Result<Invitation, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM invitations WHERE id = ?1 AND company_id = ?2"),
                [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("invitation", id))?;
        row_to_invitation(&row)
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error when no invitation carries `token`.
    pub async fn get_invitation_by_token(&self, token: &str) -> Result<Invitation, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM invitations WHERE token = ?1"),
                [token],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("invitation", "token"))?;
        row_to_invitation(&row)
    }

    /// Invitations of a company, newest first, with tokens redacted.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_invitations(
        &self,
        company_id: &str,
        status: Option<InvitationStatus>,
    ) -> Result<Vec<Invitation>, DatabaseError> {
        let mut rows = match status {
            Some(status) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM invitations
                             WHERE company_id = ?1 AND status = ?2 ORDER BY created_at DESC"
                        ),
                        [company_id, status.as_str()],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM invitations
                             WHERE company_id = ?1 ORDER BY created_at DESC"
                        ),
                        [company_id],
                    )
                    .await?
            }
        };
        let mut invitations = Vec::new();
        while let Some(row) = rows.next().await? {
            invitations.push(row_to_invitation(&row)?.redacted());
        }
        Ok(invitations)
    }

    async fn set_invitation_status(
        &self,
        invitation: &Invitation,
        status: InvitationStatus,
        accepted_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        if !invitation.status.can_transition_to(status) {
            return Err(
                CoreError::invalid_transition("invitation", &invitation.id, invitation.status, status).into(),
            );
        }
        self.db()
            .conn()
            .execute(
                "UPDATE invitations SET status = ?1, accepted_at = ?2 WHERE id = ?3",
                libsql::params![
                    status.as_str(),
                    accepted_at.map(|t| t.to_rfc3339()),
                    invitation.id.as_str()
                ],
            )
            .await?;
        Ok(())
    }

    /// Accept an invitation: create the user in the inviting company and
    /// mark the invitation accepted, atomically.
    ///
    /// An invitation found past its expiry is marked `expired` and rejected.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown token, a `BusinessRule` core error
    /// when the invitation is not pending or has expired, and `Validation`
    /// for a bad name or password.
    pub async fn accept_invitation(
        &self,
        token: &str,
        full_name: &str,
        password: &str,
        password_hash: &str,
    ) -> Result<(User, Invitation), DatabaseError> {
        let now = Utc::now();
        // `None` means the invitation had lapsed; marking it expired must
        // commit even though the acceptance is rejected.
        let accepted = self
            .write(async {
                let invitation = self.get_invitation_by_token(token).await?;
                if invitation.status != InvitationStatus::Pending {
                    return Err(DatabaseError::business_rule(format!(
                        "invitation is {}",
                        invitation.status
                    )));
                }
                if invitation.is_expired(now) {
                    self.set_invitation_status(&invitation, InvitationStatus::Expired, None)
                        .await?;
                    self.record(
                        Actor::company(&invitation.company_id),
                        EntityType::Invitation,
                        &invitation.id,
                        AuditAction::StatusChanged,
                        Some(&serde_json::json!({"from": "pending", "to": "expired"})),
                    )
                    .await?;
                    return Ok(None);
                }
                let new_user = NewUser {
                    email: invitation.email.clone(),
                    full_name: full_name.to_string(),
                    password: password.to_string(),
                    role: invitation.role,
                }
                .validate()?;
                let user = self
                    .create_user(&invitation.company_id, new_user, password_hash)
                    .await?;
                self.set_invitation_status(&invitation, InvitationStatus::Accepted, Some(now))
                    .await?;
                self.record(
                    Actor {
                        company_id: Some(&invitation.company_id),
                        user_id: Some(&user.id),
                    },
                    EntityType::User,
                    &user.id,
                    AuditAction::Joined,
                    Some(&serde_json::json!({"invitation_id": invitation.id, "role": user.role})),
                )
                .await?;
                Ok(Some((user, invitation)))
            })
            .await?;

        let Some((user, invitation)) = accepted else {
            return Err(DatabaseError::business_rule("invitation has expired"));
        };
        tracing::info!(user_id = %user.id, company_id = %user.company_id, "invitation accepted");
        let accepted = Invitation {
            status: InvitationStatus::Accepted,
            accepted_at: Some(now),
            ..invitation
        };
        Ok((user, accepted.redacted()))
    }

    /// # Errors
    ///
    /// Returns an `InvalidTransition` core error unless the invitation is
    /// pending.
    pub async fn revoke_invitation(&self, actor: &AuthIdentity, id: &str) -> Result<Invitation, DatabaseError> {
        self.write(async {
            let invitation = self.get_invitation(&actor.company_id, id).await?;
            self.set_invitation_status(&invitation, InvitationStatus::Revoked, None)
                .await?;
            self.record(
                actor.into(),
                EntityType::Invitation,
                id,
                AuditAction::StatusChanged,
                Some(&serde_json::json!({"from": invitation.status, "to": InvitationStatus::Revoked})),
            )
            .await?;
            Ok(Invitation {
                status: InvitationStatus::Revoked,
                ..invitation
            }
            .redacted())
        })
        .await
    }

    /// Issue a fresh token and push the expiry out by `ttl_days`.
    ///
    /// # Errors
    ///
    /// Returns a `BusinessRule` core error unless the invitation is pending.
    pub async fn resend_invitation(
        &self,
        actor: &AuthIdentity,
        id: &str,
        token: &str,
        ttl_days: u32,
    ) -> Result<Invitation, DatabaseError> {
        self.write(async {
            let invitation = self.get_invitation(&actor.company_id, id).await?;
            if invitation.status != InvitationStatus::Pending {
                return Err(DatabaseError::business_rule(format!(
                    "only pending invitations can be resent; this one is {}",
                    invitation.status
                )));
            }
            let expires_at = Utc::now() + Duration::days(i64::from(ttl_days));
            self.db()
                .conn()
                .execute(
                    "UPDATE invitations SET token = ?1, expires_at = ?2 WHERE id = ?3",
                    libsql::params![token, expires_at.to_rfc3339(), id],
                )
                .await?;
            self.record(actor.into(), EntityType::Invitation, id, AuditAction::Updated, NO_DETAIL)
                .await?;
            Ok(Invitation {
                token: Some(token.to_string()),
                expires_at,
                ..invitation
            })
        })
        .await
    }

    /// Mark every pending invitation past its expiry as `expired`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn expire_stale_invitations(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        self.write(async {
            let expired = self
                .db()
                .conn()
                .execute(
                    "UPDATE invitations SET status = 'expired'
                     WHERE status = 'pending' AND expires_at <= ?1",
                    [now.to_rfc3339()],
                )
                .await?;
            if expired > 0 {
                tracing::info!(expired, "stale invitations expired");
            }
            Ok(expired)
        })
        .await
    }
}
