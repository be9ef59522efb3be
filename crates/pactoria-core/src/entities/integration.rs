use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{IntegrationProvider, IntegrationStatus};

/// A company's connection state for one provider in the integration catalog.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct IntegrationConnection {
    pub id: String,
    pub company_id: String,
    pub provider: IntegrationProvider,
    pub status: IntegrationStatus,
    pub config: serde_json::Value,
    pub connected_by: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntegrationConnection {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == IntegrationStatus::Connected
    }
}
