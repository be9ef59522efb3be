//! OpenAI chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pactoria_config::ProviderConfig;

use crate::error::AiError;
use crate::http::check_response;
use crate::provider::{ChatRequest, ChatResponse, LlmProvider, TokenUsage, endpoint};

const DEFAULT_BASE: &str = "https://api.openai.com";

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl CompletionResponse {
    fn into_chat(self) -> Result<ChatResponse, AiError> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AiError::Parse("openai response has no message content".into()))?;
        Ok(ChatResponse {
            text,
            model: self.model,
            usage: self.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            url: endpoint(&config.base_url, DEFAULT_BASE, "/v1/chat/completions"),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        let body = CompletionBody {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let data: CompletionResponse = check_response(resp)
            .await?
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;
        data.into_chat()
    }
}
