//! # pactoria-ai
//!
//! Contract drafting and review through chat-completion providers.
//!
//! - [`openai`] and [`anthropic`] HTTP clients behind the [`LlmProvider`] trait
//! - [`mock`], a deterministic offline provider for development and tests
//! - [`AiService`]: providers tried in configured order, each retried with
//!   exponential backoff on rate limits, 5xx, and transport errors
//! - [`prompts`]: UK-law drafting and review prompts, and the line parser
//!   that turns review replies into warnings and suggestions
//! - [`compliance`]: the offline keyword heuristic behind compliance scores

pub mod anthropic;
pub mod compliance;
pub mod mock;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod service;

mod error;
mod http;

pub use compliance::{ComplianceChecker, ComplianceReport};
pub use error::AiError;
pub use prompts::{AnalysisResult, ClauseText, GenerationRequest, parse_analysis};
pub use provider::{ChatRequest, ChatResponse, LlmProvider, TokenUsage};
pub use service::{AiService, Completion, ContractAnalysis, ProviderInfo, RetryPolicy};
