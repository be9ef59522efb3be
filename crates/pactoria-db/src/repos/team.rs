//! Team roster management: role changes and member removal.

use pactoria_core::entities::User;
use pactoria_core::enums::{AuditAction, EntityType, UserRole};
use pactoria_core::identity::AuthIdentity;

use crate::error::DatabaseError;
use crate::service::PactoriaService;

impl PactoriaService {
    /// Active members of the caller's company, admins first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_members(&self, company_id: &str) -> Result<Vec<User>, DatabaseError> {
        self.list_users(company_id, false).await
    }

    /// Change a member's role.
    ///
    /// The actor must be allowed to assign the target role, a manager may
    /// never touch an admin, and the last active admin cannot be demoted.
    ///
    /// # Errors
    ///
    /// Returns a `BusinessRule` core error when a team rule is violated and
    /// `NotFound` when the member is not in the actor's company.
    pub async fn change_member_role(
        &self,
        actor: &AuthIdentity,
        user_id: &str,
        role: UserRole,
    ) -> Result<User, DatabaseError> {
        self.write(async {
            let member = self.get_company_user(&actor.company_id, user_id).await?;
            if !member.is_active {
                return Err(DatabaseError::business_rule(format!(
                    "user {user_id} is no longer a member"
                )));
            }
            if member.role == role {
                return Ok(member);
            }
            if !actor.role.can_assign(role) {
                return Err(DatabaseError::business_rule(format!(
                    "a {} cannot assign the {role} role",
                    actor.role
                )));
            }
            if member.role == UserRole::Admin && actor.role != UserRole::Admin {
                return Err(DatabaseError::business_rule(
                    "only an admin can change another admin's role",
                ));
            }
            if member.role == UserRole::Admin && self.count_active_admins(&actor.company_id).await? <= 1 {
                return Err(DatabaseError::business_rule(
                    "cannot demote the last active admin",
                ));
            }

            self.set_user_role(user_id, role).await?;
            self.record(
                actor.into(),
                EntityType::User,
                user_id,
                AuditAction::RoleChanged,
                Some(&serde_json::json!({"from": member.role, "to": role})),
            )
            .await?;
            tracing::info!(user_id, from = %member.role, to = %role, "member role changed");
            self.get_company_user(&actor.company_id, user_id).await
        })
        .await
    }

    /// Deactivate a member. Their history stays; they can no longer sign in.
    ///
    /// # Errors
    ///
    /// Returns a `BusinessRule` core error when removing oneself, an admin
    /// as a non-admin, or the last active admin.
    pub async fn remove_member(&self, actor: &AuthIdentity, user_id: &str) -> Result<(), DatabaseError> {
        self.write(async {
            if actor.user_id == user_id {
                return Err(DatabaseError::business_rule("you cannot remove yourself"));
            }
            let member = self.get_company_user(&actor.company_id, user_id).await?;
            if !member.is_active {
                return Ok(());
            }
            if member.role == UserRole::Admin {
                if actor.role != UserRole::Admin {
                    return Err(DatabaseError::business_rule(
                        "only an admin can remove another admin",
                    ));
                }
                if self.count_active_admins(&actor.company_id).await? <= 1 {
                    return Err(DatabaseError::business_rule(
                        "cannot remove the last active admin",
                    ));
                }
            }

            self.deactivate_user(user_id).await?;
            self.record(
                actor.into(),
                EntityType::User,
                user_id,
                AuditAction::Removed,
                Some(&serde_json::json!({"email": member.email, "role": member.role})),
            )
            .await?;
            tracing::info!(user_id, "member removed");
            Ok(())
        })
        .await
    }
}
