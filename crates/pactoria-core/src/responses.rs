//! Response shapes shared by the database layer and the HTTP API.
//!
//! These structs define the JSON returned by endpoints such as
//! `POST /auth/register`, `GET /company/usage`, `GET /analytics/dashboard`,
//! and `GET /integrations`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{AuditEntry, Company, IntegrationConnection, User};
use crate::enums::{IntegrationProvider, IntegrationStatus};

/// Returned by register, login, and invitation acceptance.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
    pub company: Company,
}

/// Seat consumption against the subscription tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SeatUsage {
    pub active_members: u32,
    pub pending_invitations: u32,
    pub max_users: u32,
}

impl SeatUsage {
    #[must_use]
    pub const fn used(&self) -> u32 {
        self.active_members + self.pending_invitations
    }

    #[must_use]
    pub const fn available(&self) -> u32 {
        self.max_users.saturating_sub(self.used())
    }

    #[must_use]
    pub const fn has_free_seat(&self) -> bool {
        self.used() < self.max_users
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CountByKey {
    pub key: String,
    pub count: u64,
}

/// Contracts created in a calendar month (`YYYY-MM`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MonthlyCount {
    pub month: String,
    pub count: u64,
}

/// Response from `GET /analytics/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DashboardStats {
    pub total_contracts: u64,
    pub by_status: Vec<CountByKey>,
    pub by_type: Vec<CountByKey>,
    pub active_contract_value: f64,
    pub average_contract_value: Option<f64>,
    pub average_compliance_score: Option<f64>,
    pub expiring_soon: u64,
    pub monthly_created: Vec<MonthlyCount>,
    pub recent_activity: Vec<AuditEntry>,
}

/// Response from `GET /analytics/compliance`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ComplianceOverview {
    pub scored_contracts: u64,
    pub average_score: Option<f64>,
    /// Score >= 0.8.
    pub high: u64,
    /// 0.6 <= score < 0.8.
    pub medium: u64,
    /// Score < 0.6.
    pub low: u64,
    pub unscored: u64,
}

/// One catalog entry in `GET /integrations`, merged with the company's state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct IntegrationInfo {
    pub provider: IntegrationProvider,
    pub name: String,
    pub category: String,
    pub description: String,
    pub status: IntegrationStatus,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl IntegrationInfo {
    /// Catalog entry for `provider`, filled from `connection` when present.
    #[must_use]
    pub fn from_catalog(
        provider: IntegrationProvider,
        connection: Option<&IntegrationConnection>,
    ) -> Self {
        Self {
            provider,
            name: provider.display_name().to_string(),
            category: provider.category().to_string(),
            description: provider.description().to_string(),
            status: connection.map_or(IntegrationStatus::Disconnected, |c| c.status),
            connected_at: connection.and_then(|c| c.connected_at),
            last_sync_at: connection.and_then(|c| c.last_sync_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_usage_counts_pending_invitations() {
        let usage = SeatUsage {
            active_members: 3,
            pending_invitations: 2,
            max_users: 5,
        };
        assert_eq!(usage.used(), 5);
        assert_eq!(usage.available(), 0);
        assert!(!usage.has_free_seat());
    }

    #[test]
    fn catalog_entry_without_connection_is_disconnected() {
        let info = IntegrationInfo::from_catalog(IntegrationProvider::Xero, None);
        assert_eq!(info.status, IntegrationStatus::Disconnected);
        assert_eq!(info.category, "accounting");
        assert_eq!(info.name, "Xero");
    }
}
