//! User repository.
//!
//! Password hashes are stored here but never leave this module inside a
//! `User`; login and password changes go through [`UserCredentials`].

use chrono::Utc;

use pactoria_core::entities::{NewUser, User};
use pactoria_core::enums::{AuditAction, EntityType, UserRole};
use pactoria_core::identity::AuthIdentity;
use pactoria_core::ids::PREFIX_USER;

use crate::error::DatabaseError;
use crate::helpers::{
    get_bool, get_count, get_opt_string, parse_datetime, parse_enum, parse_optional_datetime,
};
use crate::service::{Actor, PactoriaService};
use crate::updates::SetList;
use crate::updates::profile::ProfileUpdate;

pub(crate) const SELECT_COLS: &str =
    "id, company_id, email, full_name, role, is_active, last_login_at, created_at, updated_at";

/// A user together with their stored password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

pub(crate) fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.get(0)?,
        company_id: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        role: parse_enum(&row.get::<String>(4)?)?,
        is_active: get_bool(row, 5)?,
        last_login_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl PactoriaService {
    /// Whether any user (active or not) already has this email.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn email_registered(&self, email: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE", [email])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Insert a user into `company_id`. `password_hash` is produced by the
    /// auth layer; the plain password in `input` is only validated.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input or a duplicate email.
    pub async fn create_user(
        &self,
        company_id: &str,
        input: NewUser,
        password_hash: &str,
    ) -> Result<User, DatabaseError> {
        self.write(async {
            let input = input.validate()?;
            if self.email_registered(&input.email).await? {
                return Err(DatabaseError::business_rule(format!(
                    "a user with email {} already exists",
                    input.email
                )));
            }

            let now = Utc::now();
            let id = self.db().generate_id(PREFIX_USER).await?;
            self.db()
                .conn()
                .execute(
                    "INSERT INTO users (id, company_id, email, full_name, password_hash, role, is_active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)",
                    libsql::params![
                        id.as_str(),
                        company_id,
                        input.email.as_str(),
                        input.full_name.as_str(),
                        password_hash,
                        input.role.as_str(),
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await?;

            let user = User {
                id,
                company_id: company_id.to_string(),
                email: input.email,
                full_name: input.full_name,
                role: input.role,
                is_active: true,
                last_login_at: None,
                created_at: now,
                updated_at: now,
            };

            self.record(
                Actor {
                    company_id: Some(company_id),
                    user_id: Some(&user.id),
                },
                EntityType::User,
                &user.id,
                AuditAction::Created,
                Some(&serde_json::json!({"email": user.email, "role": user.role})),
            )
            .await?;

            Ok(user)
        })
        .await
    }

    /// Look up a user by id regardless of company.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` core error when no such user exists.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM users WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", id))?;
        row_to_user(&row)
    }

    /// Look up a user that belongs to `company_id`.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` core error for unknown ids and other tenants' users.
    pub async fn get_company_user(&self, company_id: &str, id: &str) -> Result<User, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM users WHERE id = ?1 AND company_id = ?2"),
                [id, company_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", id))?;
        row_to_user(&row)
    }

    /// Case-insensitive lookup for login.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS}, password_hash FROM users WHERE email = ?1 COLLATE NOCASE"),
                [email.trim()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(UserCredentials {
                user: row_to_user(&row)?,
                password_hash: row.get(9)?,
            })),
            None => Ok(None),
        }
    }

    /// Stored password hash for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` core error when no such user exists.
    pub async fn get_password_hash(&self, user_id: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT password_hash FROM users WHERE id = ?1", [user_id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", user_id))?;
        Ok(row.get(0)?)
    }

    /// Users of a company, admins first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_users(
        &self,
        company_id: &str,
        include_inactive: bool,
    ) -> Result<Vec<User>, DatabaseError> {
        let active_clause = if include_inactive { "" } else { " AND is_active = 1" };
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM users WHERE company_id = ?1{active_clause}
                     ORDER BY CASE role WHEN 'admin' THEN 0 WHEN 'manager' THEN 1 WHEN 'member' THEN 2 ELSE 3 END,
                              full_name COLLATE NOCASE"
                ),
                [company_id],
            )
            .await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Active admins of a company (notification fan-out targets).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_admins(&self, company_id: &str) -> Result<Vec<User>, DatabaseError> {
        Ok(self
            .list_users(company_id, false)
            .await?
            .into_iter()
            .filter(|u| u.role == UserRole::Admin)
            .collect())
    }

    /// Update the caller's own name or email.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on invalid input or an email taken by
    /// another user.
    pub async fn update_profile(
        &self,
        actor: &AuthIdentity,
        update: ProfileUpdate,
    ) -> Result<User, DatabaseError> {
        self.write(async {
            let update = update.validate()?;
            let current = self.get_user(&actor.user_id).await?;

            let mut sets = SetList::default();
            if let Some(ref name) = update.full_name {
                sets.push("full_name", name.clone());
            }
            if let Some(ref email) = update.email {
                if !email.eq_ignore_ascii_case(&current.email) && self.email_registered(email).await? {
                    return Err(DatabaseError::business_rule(format!(
                        "a user with email {email} already exists"
                    )));
                }
                sets.push("email", email.clone());
            }
            if sets.is_empty() {
                return Ok(current);
            }
            sets.push("updated_at", Utc::now().to_rfc3339());
            let (sql, params) = sets.into_update("users", &actor.user_id);
            self.db()
                .conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;

            let updated = self.get_user(&actor.user_id).await?;
            self.record(
                actor.into(),
                EntityType::User,
                &actor.user_id,
                AuditAction::Updated,
                Some(&update),
            )
            .await?;
            Ok(updated)
        })
        .await
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` core error when no such user exists.
    pub async fn set_password_hash(
        &self,
        actor: &AuthIdentity,
        password_hash: &str,
    ) -> Result<(), DatabaseError> {
        self.write(async {
            let changed = self
                .db()
                .conn()
                .execute(
                    "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
                    libsql::params![password_hash, Utc::now().to_rfc3339(), actor.user_id.as_str()],
                )
                .await?;
            if changed == 0 {
                return Err(DatabaseError::not_found("user", &actor.user_id));
            }
            self.record(
                actor.into(),
                EntityType::User,
                &actor.user_id,
                AuditAction::Updated,
                Some(&serde_json::json!({"password": "changed"})),
            )
            .await?;
            Ok(())
        })
        .await
    }

    /// Stamp `last_login_at`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn record_login(&self, user_id: &str) -> Result<(), DatabaseError> {
        self.write(async {
            self.db()
                .conn()
                .execute(
                    "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
                    libsql::params![Utc::now().to_rfc3339(), user_id],
                )
                .await?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn set_user_role(&self, user_id: &str, role: UserRole) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![role.as_str(), Utc::now().to_rfc3339(), user_id],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn deactivate_user(&self, user_id: &str) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE users SET is_active = 0, updated_at = ?1 WHERE id = ?2",
                libsql::params![Utc::now().to_rfc3339(), user_id],
            )
            .await?;
        Ok(())
    }

    /// Number of active admins in a company.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_active_admins(&self, company_id: &str) -> Result<u64, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM users WHERE company_id = ?1 AND role = 'admin' AND is_active = 1",
                [company_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_count(&row, 0)
    }

    /// Number of active users in a company.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_active_members(&self, company_id: &str) -> Result<u64, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM users WHERE company_id = ?1 AND is_active = 1",
                [company_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_count(&row, 0)
    }
}
