use pactoria_core::enums::Permission;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    TokenExpired,

    #[error("token was issued by '{0}'")]
    WrongIssuer(String),

    #[error("missing permission: {0}")]
    Forbidden(Permission),

    #[error("token signing is not configured: {0}")]
    NotConfigured(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("random source unavailable: {0}")]
    Random(String),
}

impl AuthError {
    /// Errors that mean "who are you?" rather than "you may not".
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::InvalidToken(_)
                | Self::TokenExpired
                | Self::WrongIssuer(_)
        )
    }
}
