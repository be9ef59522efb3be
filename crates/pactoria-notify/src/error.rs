use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid email recipient: {0}")]
    InvalidRecipient(String),

    #[error("malformed WebSocket message: {0}")]
    BadMessage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
