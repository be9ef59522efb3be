use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{InvitationStatus, UserRole};

/// An invitation for someone to join a company.
///
/// The token only leaves the server in the invitation email; every API
/// response goes through [`Invitation::redacted`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Invitation {
    pub id: String,
    pub company_id: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub status: InvitationStatus,
    pub invited_by: String,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Pending and not yet past its expiry.
    #[must_use]
    pub fn is_acceptable(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired(now)
    }

    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.token = None;
        self
    }
}
