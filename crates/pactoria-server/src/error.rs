//! HTTP error envelope.
//!
//! Every failure leaves the API as
//! `{"error": {"code", "message", "details", "request_id"}}`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};

use pactoria_ai::AiError;
use pactoria_auth::AuthError;
use pactoria_core::errors::CoreError;
use pactoria_db::error::DatabaseError;

use crate::middleware::current_request_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationFailed,
    BusinessRule,
    InvalidTransition,
    Unauthorized,
    Forbidden,
    NotFound,
    PayloadTooLarge,
    AiUnavailable,
    InternalError,
}

impl ErrorCode {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BusinessRule | Self::InvalidTransition => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AiUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: json!({}),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ValidationFailed, format!("{field}: {message}"))
            .with_details(json!({"field": field, "message": message}))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(entity_type: &str, id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{entity_type} not found: {id}"))
            .with_details(json!({"entity_type": entity_type, "id": id}))
    }

    /// Generic 500; the cause is logged, never returned.
    pub fn internal(cause: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "internal error");
        Self::new(ErrorCode::InternalError, "an internal error occurred")
    }

    /// An unreadable request body: 413 past the size limit, else 422.
    pub fn body_rejected(status: StatusCode, message: String) -> Self {
        let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
            ErrorCode::PayloadTooLarge
        } else {
            ErrorCode::ValidationFailed
        };
        Self::new(code, message).with_details(json!({"source": "body"}))
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "details": self.details,
                "request_id": current_request_id(),
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity_type, id } => Self::not_found(&entity_type, &id),
            CoreError::Validation { field, message } => Self::validation(&field, message),
            CoreError::BusinessRule(message) => Self::new(ErrorCode::BusinessRule, message),
            CoreError::InvalidTransition {
                entity_type,
                id,
                from,
                to,
            } => Self::new(
                ErrorCode::InvalidTransition,
                format!("{entity_type} {id} cannot move from {from} to {to}"),
            )
            .with_details(json!({"entity_type": entity_type, "id": id, "from": from, "to": to})),
            CoreError::Other(e) => Self::internal(&e),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Core(core) => core.into(),
            other => Self::internal(&other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(permission) => Self::new(
                ErrorCode::Forbidden,
                format!("your role does not allow {permission}"),
            )
            .with_details(json!({"permission": permission})),
            e if e.is_unauthenticated() => Self::unauthorized(e.to_string()),
            other => Self::internal(&other),
        }
    }
}

impl From<AiError> for ApiError {
    fn from(err: AiError) -> Self {
        tracing::warn!(error = %err, "ai request failed");
        let message = match &err {
            AiError::NotConfigured(_) => "no AI provider is configured",
            _ => "the AI service is currently unavailable",
        };
        Self::new(ErrorCode::AiUnavailable, message).with_details(json!({"reason": err.to_string()}))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::body_rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(ErrorCode::ValidationFailed, rejection.body_text())
            .with_details(json!({"source": "query"}))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(ErrorCode::ValidationFailed, rejection.body_text())
            .with_details(json!({"source": "path"}))
    }
}
