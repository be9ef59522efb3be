//! Provider fallback with per-provider retry and exponential backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use pactoria_config::AiConfig;
use pactoria_core::enums::ContractType;

use crate::anthropic::AnthropicProvider;
use crate::compliance::{ComplianceChecker, ComplianceReport};
use crate::error::AiError;
use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;
use crate::prompts::{
    ANALYSIS_SYSTEM_PROMPT, AnalysisResult, DRAFTING_SYSTEM_PROMPT, GenerationRequest, contract_analysis_prompt,
    contract_generation_prompt, parse_analysis,
};
use crate::provider::{ChatRequest, LlmProvider, TokenUsage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt, per provider.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn from_config(config: &AiConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay before retry number `attempt` (0-based) after `err`.
    ///
    /// `min(base * 2^attempt, max_delay)`, except that a rate limit's
    /// `Retry-After` wins when it is shorter than `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, err: &AiError) -> Duration {
        if let AiError::RateLimited { retry_after_secs } = err {
            let hinted = Duration::from_secs(*retry_after_secs);
            if hinted < self.max_delay {
                return hinted;
            }
        }
        let factor = 2_u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// A successful completion and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
    pub elapsed_ms: u64,
}

/// A completion plus the findings parsed from it and the local heuristic check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractAnalysis {
    pub completion: Completion,
    pub findings: AnalysisResult,
    pub compliance: ComplianceReport,
    /// The provider's score when it gave one, otherwise the heuristic score.
    pub compliance_score: f64,
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}

pub struct AiService {
    providers: Vec<Arc<dyn LlmProvider>>,
    retry: RetryPolicy,
    max_tokens: u32,
    temperature: f32,
    checker: ComplianceChecker,
}

impl AiService {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>, retry: RetryPolicy) -> Self {
        let defaults = AiConfig::default();
        Self {
            providers,
            retry,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            checker: ComplianceChecker,
        }
    }

    /// Build providers in the configured order, skipping those without a key.
    ///
    /// With `use_mock` set only the mock provider is used. An empty provider
    /// list is allowed; completions then fail with `NotConfigured`.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
        if config.use_mock {
            providers.push(Arc::new(MockProvider::new()));
        } else {
            let http = reqwest::Client::builder()
                .user_agent(concat!("pactoria/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?;
            for name in &config.providers {
                match name.as_str() {
                    "openai" if config.openai.is_configured() => {
                        providers.push(Arc::new(OpenAiProvider::new(http.clone(), &config.openai)));
                    }
                    "anthropic" if config.anthropic.is_configured() => {
                        providers.push(Arc::new(AnthropicProvider::new(http.clone(), &config.anthropic)));
                    }
                    "openai" | "anthropic" => {
                        tracing::debug!(provider = %name, "AI provider has no API key, skipping");
                    }
                    other => tracing::warn!(provider = other, "unknown AI provider in config, skipping"),
                }
            }
        }
        tracing::info!(providers = providers.len(), mock = config.use_mock, "AI service ready");
        Ok(Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            ..Self::new(providers, RetryPolicy::from_config(config))
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    #[must_use]
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|p| ProviderInfo {
                name: p.name().to_string(),
                model: p.model().to_string(),
            })
            .collect()
    }

    #[must_use]
    pub const fn checker(&self) -> &ComplianceChecker {
        &self.checker
    }

    /// Try each provider in order, retrying retryable failures.
    ///
    /// # Errors
    ///
    /// `NotConfigured` with no providers, `AllProvidersFailed` when every
    /// provider gave up.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, AiError> {
        if self.providers.is_empty() {
            return Err(AiError::NotConfigured("no AI provider has an API key".into()));
        }
        let request = ChatRequest {
            system: system.to_string(),
            prompt: prompt.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut failures = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let started = Instant::now();
            let mut attempt = 0;
            let outcome = loop {
                match provider.complete(&request).await {
                    Ok(resp) => break Ok(resp),
                    Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                        let delay = self.retry.delay_for(attempt, &err);
                        tracing::warn!(
                            provider = provider.name(),
                            attempt = attempt + 1,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            %err,
                            "AI call failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Err(err) => break Err(err),
                }
            };

            match outcome {
                Ok(resp) => {
                    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    tracing::info!(
                        provider = provider.name(),
                        model = %resp.model,
                        tokens = resp.usage.total(),
                        elapsed_ms,
                        "AI completion"
                    );
                    return Ok(Completion {
                        text: resp.text,
                        provider: provider.name().to_string(),
                        model: resp.model,
                        usage: resp.usage,
                        elapsed_ms,
                    });
                }
                Err(err) => {
                    tracing::warn!(provider = provider.name(), %err, "AI provider failed, falling back");
                    failures.push(format!("{}: {err}", provider.name()));
                }
            }
        }
        Err(AiError::AllProvidersFailed(failures))
    }

    /// Draft contract text.
    ///
    /// # Errors
    ///
    /// See [`AiService::complete`].
    pub async fn generate_contract(&self, request: &GenerationRequest) -> Result<Completion, AiError> {
        self.complete(DRAFTING_SYSTEM_PROMPT, &contract_generation_prompt(request))
            .await
    }

    /// Ask a provider for findings and combine them with the local check.
    ///
    /// # Errors
    ///
    /// See [`AiService::complete`].
    pub async fn analyze_contract(
        &self,
        content: &str,
        contract_type: Option<ContractType>,
    ) -> Result<ContractAnalysis, AiError> {
        let completion = self
            .complete(ANALYSIS_SYSTEM_PROMPT, &contract_analysis_prompt(content, contract_type))
            .await?;
        let findings = parse_analysis(&completion.text);
        let compliance = self.checker.check(content, contract_type);
        let compliance_score = findings.score.unwrap_or(compliance.overall_score);
        Ok(ContractAnalysis {
            risk_score: crate::compliance::risk_from_compliance(compliance_score),
            compliance_score,
            completion,
            findings,
            compliance,
        })
    }
}
