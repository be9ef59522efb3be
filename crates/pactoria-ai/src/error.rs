//! AI provider error types.

use thiserror::Error;

/// Errors from chat-completion providers and the fallback loop.
#[derive(Debug, Error)]
pub enum AiError {
    /// Transport error, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// No provider has credentials.
    #[error("AI is not configured: {0}")]
    NotConfigured(String),

    /// Every provider failed; one message per provider in attempt order.
    #[error("all AI providers failed: {}", .0.join("; "))]
    AllProvidersFailed(Vec<String>),
}

impl AiError {
    /// Whether the same provider should be tried again after a delay.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) | Self::NotConfigured(_) | Self::AllProvidersFailed(_) => false,
        }
    }
}
