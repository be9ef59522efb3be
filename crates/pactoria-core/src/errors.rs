//! Cross-cutting error types for Pactoria.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `AiError`) are defined in
//! their respective crates and wrap `CoreError` where a domain rule is the
//! root cause. The HTTP layer maps each variant to a status code.

use thiserror::Error;

/// Errors that can be raised by any Pactoria crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result (or belongs to another company).
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// A field failed validation.
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// A business rule rejected the operation (e.g., removing the last admin).
    #[error("{0}")]
    BusinessRule(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRule(message.into())
    }

    pub fn invalid_transition(
        entity_type: impl Into<String>,
        id: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity_type: entity_type.into(),
            id: id.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
