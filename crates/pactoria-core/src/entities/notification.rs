use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityType, NotificationType, Priority};
use crate::errors::CoreError;
use crate::validation::{self, MAX_TITLE_LEN};

const MAX_MESSAGE_LEN: usize = 2000;

/// An in-app notification addressed to one user.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub company_id: String,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: String,
    pub company_id: String,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub action_url: Option<String>,
}

impl NewNotification {
    /// A medium-priority notification with no linked entity.
    pub fn new(
        user_id: impl Into<String>,
        company_id: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            company_id: company_id.into(),
            notification_type,
            priority: Priority::Medium,
            title: title.into(),
            message: message.into(),
            entity_type: None,
            entity_id: None,
            action_url: None,
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn about(mut self, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type);
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            title: validation::required_text("title", &self.title, MAX_TITLE_LEN)?,
            message: validation::required_text("message", &self.message, MAX_MESSAGE_LEN)?,
            ..self
        })
    }
}
