//! Anthropic messages client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pactoria_config::ProviderConfig;

use crate::error::AiError;
use crate::http::check_response;
use crate::provider::{ChatRequest, ChatResponse, LlmProvider, TokenUsage, endpoint};

const DEFAULT_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    system: &'a str,
    messages: [Message<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn into_chat(self) -> Result<ChatResponse, AiError> {
        let text: String = self
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(AiError::Parse("anthropic response has no text blocks".into()));
        }
        Ok(ChatResponse {
            text,
            model: self.model,
            usage: self.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}

pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl AnthropicProvider {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            url: endpoint(&config.base_url, DEFAULT_BASE, "/v1/messages"),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        let body = MessagesBody {
            model: &self.model,
            system: &request.system,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let resp = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;
        let data: MessagesResponse = check_response(resp)
            .await?
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;
        data.into_chat()
    }
}
