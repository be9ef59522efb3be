//! The provider seam shared by real and mock chat-completion backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

/// One single-turn chat request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// What a provider returns for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub text: String,
    /// Model that actually answered, as reported by the provider.
    pub model: String,
    pub usage: TokenUsage,
}

/// A chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name used in config and logs, e.g. `openai`.
    fn name(&self) -> &str;

    /// Configured model id.
    fn model(&self) -> &str;

    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] on transport failure, a non-success status, or an
    /// unparseable body.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError>;
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base_url: &str, default_base: &str, path: &str) -> String {
    let base = if base_url.is_empty() { default_base } else { base_url };
    format!("{}{path}", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_cleanly() {
        assert_eq!(
            endpoint("", "https://api.openai.com", "/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:9000/", "https://api.openai.com", "/v1/messages"),
            "http://127.0.0.1:9000/v1/messages"
        );
    }
}
