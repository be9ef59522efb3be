use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::UserRole;
use crate::errors::CoreError;
use crate::validation::{self, MAX_NAME_LEN};

/// A user account. Credentials live in their own column and never leave the
/// database layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub company_id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user. The password is checked against the policy
/// here and hashed by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: UserRole,
}

impl NewUser {
    pub fn validate(self) -> Result<Self, CoreError> {
        validation::password(&self.password)?;
        Ok(Self {
            email: validation::email("email", &self.email)?,
            full_name: validation::required_text("full_name", &self.full_name, MAX_NAME_LEN)?,
            password: self.password,
            role: self.role,
        })
    }
}
