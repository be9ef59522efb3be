//! LLM provider configuration.

use serde::{Deserialize, Serialize};

fn default_providers() -> Vec<String> {
    vec!["openai".to_string(), "anthropic".to_string()]
}

const fn default_max_tokens() -> u32 {
    2000
}

const fn default_temperature() -> f32 {
    0.3
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    500
}

const fn default_max_delay_ms() -> u64 {
    8000
}

/// Credentials and endpoint for one chat-completion provider.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub model: String,

    /// Overrides the public API host, e.g. for a proxy or a test server.
    #[serde(default)]
    pub base_url: String,
}

impl ProviderConfig {
    fn with_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Default::default()
        }
    }

    /// A provider is usable iff it has an API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn default_openai() -> ProviderConfig {
    ProviderConfig::with_model("gpt-4o-mini")
}

fn default_anthropic() -> ProviderConfig {
    ProviderConfig::with_model("claude-3-5-haiku-latest")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    /// Provider names in fallback order.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    #[serde(default = "default_openai")]
    pub openai: ProviderConfig,

    #[serde(default = "default_anthropic")]
    pub anthropic: ProviderConfig,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries per provider for retryable failures (rate limits, 5xx, timeouts).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Use the deterministic offline provider instead of real APIs.
    #[serde(default)]
    pub use_mock: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            openai: default_openai(),
            anthropic: default_anthropic(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            use_mock: false,
        }
    }
}

impl AiConfig {
    /// Check if at least one real provider has credentials, or the mock is enabled.
    pub fn is_configured(&self) -> bool {
        self.use_mock || self.openai.is_configured() || self.anthropic.is_configured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = AiConfig::default();
        assert_eq!(config.providers, vec!["openai", "anthropic"]);
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.anthropic.model, "claude-3-5-haiku-latest");
        assert_eq!(config.max_retries, 3);
        assert!(!config.is_configured());
    }

    #[test]
    fn configured_with_one_key() {
        let mut config = AiConfig::default();
        config.anthropic.api_key = "sk-ant-test".into();
        assert!(config.is_configured());
        assert!(!config.openai.is_configured());
    }

    #[test]
    fn mock_counts_as_configured() {
        let config = AiConfig {
            use_mock: true,
            ..Default::default()
        };
        assert!(config.is_configured());
    }
}
