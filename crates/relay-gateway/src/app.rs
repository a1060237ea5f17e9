use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use relay_channels::{
    AdapterRegistry, CredentialStore, RetryPolicy, SignatureVerifier, WebhookAdapter,
    WhatsAppAdapter,
};
use relay_core::config::RelayConfig;
use relay_research::{HttpResearchClient, ResearchBackend};
use relay_telegram::TelegramAdapter;

use crate::dispatch::Dispatcher;

/// Central shared state, passed as `Arc<AppState>` to every handler.
///
/// Everything in here is read-only after start-up; concurrent requests
/// share it without locking.
pub struct AppState {
    pub config: RelayConfig,
    pub credentials: CredentialStore,
    pub verifier: SignatureVerifier,
    pub adapters: AdapterRegistry,
    pub research: Arc<dyn ResearchBackend>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(config: RelayConfig, research: Arc<dyn ResearchBackend>) -> Self {
        Self {
            credentials: CredentialStore::from_config(&config.auth),
            verifier: SignatureVerifier::from_config(&config),
            adapters: build_adapters(&config),
            dispatcher: Dispatcher::from_config(&config),
            research,
            config,
        }
    }

    /// State backed by the HTTP research client named in `config.research`.
    pub fn from_config(config: RelayConfig) -> Self {
        let research: Arc<dyn ResearchBackend> =
            Arc::new(HttpResearchClient::from_config(&config.research));
        Self::new(config, research)
    }
}

/// One adapter per configured channel. The generic webhook adapter is always present.
pub fn build_adapters(config: &RelayConfig) -> AdapterRegistry {
    let retry = RetryPolicy::from_config(&config.delivery.retry);
    let mut registry = AdapterRegistry::new();

    registry.register(Arc::new(WebhookAdapter::new()));

    if let Some(wa) = &config.channels.whatsapp {
        registry.register(Arc::new(WhatsAppAdapter::new(wa.clone(), retry.clone())));
    }

    if let Some(tg) = &config.channels.telegram {
        match TelegramAdapter::new(tg, retry) {
            Ok(adapter) => registry.register(Arc::new(adapter)),
            Err(e) => warn!(error = %e, "telegram channel configured but disabled"),
        }
    }

    info!(channels = ?registry.kinds(), "channel adapters ready");
    registry
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-webhook-signature"),
        ]);

    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route(
            "/webhooks/whatsapp",
            get(crate::http::whatsapp::verify_handler).post(crate::http::whatsapp::receive_handler),
        )
        .route(
            "/webhooks/telegram",
            post(crate::http::telegram::receive_handler),
        )
        .route(
            "/webhooks/incoming",
            post(crate::http::incoming::incoming_handler),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
