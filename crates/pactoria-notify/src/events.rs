//! WebSocket message envelope.
//!
//! Server to client: `{"type": "notification", "data": {...}}`,
//! `{"type": "unread_count", "data": {"count": 3}}`, `{"type": "pong"}`,
//! `{"type": "error", "data": {"message": "..."}}`.
//!
//! Client to server: `{"type": "ping"}` and
//! `{"type": "mark_read", "notification_id": "ntf-..."}`.

use serde::{Deserialize, Serialize};

use pactoria_core::entities::Notification;

use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WsEvent {
    Notification(Notification),
    UnreadCount { count: u64 },
    Pong,
    Error { message: String },
}

impl WsEvent {
    /// # Errors
    ///
    /// Returns `NotifyError::Serialization` if the payload cannot be encoded.
    pub fn to_json(&self) -> Result<String, NotifyError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    MarkRead { notification_id: String },
}

impl ClientMessage {
    /// # Errors
    ///
    /// Returns `NotifyError::BadMessage` for anything that is not a known
    /// client message.
    pub fn parse(text: &str) -> Result<Self, NotifyError> {
        serde_json::from_str(text).map_err(|e| NotifyError::BadMessage(e.to_string()))
    }
}
