//! Deterministic offline provider.
//!
//! Used when `ai.use_mock` is set and by tests. Drafting prompts get a
//! fixed UK contract skeleton; prompts that ask for a `SCORE:` line get an
//! answer in the analysis line format.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::AiError;
use crate::provider::{ChatRequest, ChatResponse, LlmProvider, TokenUsage};

pub const MOCK_MODEL: &str = "pactoria-mock-1";

pub struct MockProvider {
    name: String,
    failures: Mutex<VecDeque<AiError>>,
    calls: AtomicU32,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::named("mock")
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
        }
    }

    /// Fail the next calls with `errors`, in order, then succeed.
    #[must_use]
    pub fn with_failures(self, errors: impl IntoIterator<Item = AiError>) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(errors);
        self
    }

    /// Number of `complete` calls so far, failed ones included.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

fn word_count(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

fn draft_for(prompt: &str) -> String {
    let title = prompt
        .lines()
        .find_map(|l| l.strip_prefix("Title: "))
        .unwrap_or("Agreement")
        .trim()
        .to_uppercase();
    format!(
        "{title}\n\n\
         1. PARTIES AND DEFINITIONS\n\
         This agreement is made between the parties named in the schedule.\n\n\
         2. SERVICES AND PAYMENT TERMS\n\
         The supplier shall provide the services. Invoices are payable within 30 days.\n\n\
         3. CONFIDENTIALITY\n\
         Each party shall keep the other's confidential information secret.\n\n\
         4. DATA PROTECTION\n\
         Each party shall comply with the UK GDPR and the Data Protection Act 2018.\n\n\
         5. LIMITATION OF LIABILITY\n\
         Neither party limits liability for death or personal injury caused by negligence.\n\n\
         6. TERMINATION\n\
         Either party may terminate on 30 days' written notice.\n\n\
         7. DISPUTE RESOLUTION\n\
         The parties shall attempt mediation before court proceedings.\n\n\
         8. GOVERNING LAW AND JURISDICTION\n\
         This agreement is governed by the law of England and Wales and the courts of \
         England and Wales have exclusive jurisdiction.\n"
    )
}

fn analysis_for(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    let mut lines = Vec::new();
    if !lower.contains("governing law") {
        lines.push("WARNING: No governing law clause was found.");
    }
    if !lower.contains("gdpr") && !lower.contains("data protection") {
        lines.push("RISK: Personal data handling is not addressed.");
    }
    lines.push("SUGGESTION: Define the payment schedule precisely.");
    lines.push("RECOMMENDATION: Have a solicitor review the liability cap.");
    let score = if lines.len() > 2 { "0.55" } else { "0.85" };
    format!("{}\nSCORE: {score}\n", lines.join("\n"))
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        MOCK_MODEL
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(err) = scripted {
            return Err(err);
        }

        let text = if request.prompt.contains("SCORE:") {
            analysis_for(&request.prompt)
        } else {
            draft_for(&request.prompt)
        };
        Ok(ChatResponse {
            usage: TokenUsage {
                input_tokens: word_count(&request.system) + word_count(&request.prompt),
                output_tokens: word_count(&text),
            },
            text,
            model: MOCK_MODEL.to_string(),
        })
    }
}
