//! Role-based permission checks on an authenticated identity.

use pactoria_core::enums::Permission;
use pactoria_core::identity::AuthIdentity;

use crate::error::AuthError;

pub trait RequirePermission {
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` when the identity's role lacks
    /// `permission`.
    fn require(&self, permission: Permission) -> Result<(), AuthError>;
}

impl RequirePermission for AuthIdentity {
    fn require(&self, permission: Permission) -> Result<(), AuthError> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.user_id, role = %self.role, %permission, "permission denied");
            Err(AuthError::Forbidden(permission))
        }
    }
}
