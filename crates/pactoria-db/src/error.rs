//! Database error types for pactoria-db.

use pactoria_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned data that could not be decoded.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A domain rule rejected the operation (validation, not found,
    /// invalid transition, business rule).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity_type: &str, id: &str) -> Self {
        Self::Core(CoreError::not_found(entity_type, id))
    }

    pub(crate) fn business_rule(message: impl Into<String>) -> Self {
        Self::Core(CoreError::business_rule(message))
    }

    pub(crate) fn json(e: serde_json::Error) -> Self {
        Self::Other(e.into())
    }

    /// The wrapped domain error, if any.
    #[must_use]
    pub const fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            _ => None,
        }
    }
}
