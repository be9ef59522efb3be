//! Shared application resources, built once at startup and cloned into
//! every handler.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use anyhow::Context;

use pactoria_ai::AiService;
use pactoria_auth::TokenIssuer;
use pactoria_config::PactoriaConfig;
use pactoria_core::pagination::PageRequest;
use pactoria_db::service::PactoriaService;
use pactoria_notify::{EmailSender, NotificationHub, sender_from_config};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PactoriaService>,
    pub config: Arc<PactoriaConfig>,
    pub tokens: Arc<TokenIssuer>,
    pub ai: Arc<AiService>,
    pub hub: Arc<NotificationHub>,
    pub email: Arc<dyn EmailSender>,
    pub request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    /// Open the database and build every client from `config`.
    ///
    /// `tokens` is passed in so `serve --dev` can supply an ephemeral
    /// signing secret.
    ///
    /// # Errors
    ///
    /// Fails when the database cannot be opened or the AI clients cannot
    /// be built.
    pub async fn from_config(config: PactoriaConfig, tokens: TokenIssuer) -> anyhow::Result<Self> {
        let service = PactoriaService::new_local(&config.database.path)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;
        let ai = AiService::from_config(&config.ai).context("failed to build AI providers")?;
        if !ai.is_configured() {
            tracing::warn!("no AI provider configured; generation and analysis will return 503");
        }
        let email = sender_from_config(&config.email);
        Ok(Self::new(config, service, tokens, ai, email))
    }

    #[must_use]
    pub fn new(
        config: PactoriaConfig,
        service: PactoriaService,
        tokens: TokenIssuer,
        ai: AiService,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            ai: Arc::new(ai),
            hub: Arc::new(NotificationHub::new()),
            email,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Page request clamped to the configured sizes.
    #[must_use]
    pub fn page(&self, page: Option<u32>, size: Option<u32>) -> PageRequest {
        PageRequest::clamped(
            page,
            size,
            self.config.general.default_page_size,
            self.config.general.max_page_size,
        )
    }
}
