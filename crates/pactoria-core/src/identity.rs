use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Permission, UserRole};

/// Lightweight authenticated user identity for cross-crate passing.
///
/// Produced by `pactoria-auth` from verified token claims, consumed by the
/// service layer for tenant scoping and by handlers for permission checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthIdentity {
    pub user_id: String,
    pub company_id: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthIdentity {
    #[must_use]
    pub const fn can(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }
}
