//! Common test utilities.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use relay_core::{config::RelayConfig, ResearchAnswer};
use relay_gateway::app::{build_router, AppState};
use relay_research::{ResearchBackend, ResearchRequest};

pub const WEBHOOK_KEY: &str = "demo-webhook-key-abcde";
pub const INTEGRATION_KEY: &str = "demo-integration-key-12345";
pub const INTEGRATION_SECRET: &str = "integration-secret";
pub const WA_APP_SECRET: &str = "wa-app-secret";
pub const WA_VERIFY_TOKEN: &str = "verify-me";
pub const TG_TOKEN: &str = "123:ABC";

/// Research backend that records every request and answers with fixed text.
pub struct MockResearch {
    answer: ResearchAnswer,
    calls: AtomicUsize,
    requests: Mutex<Vec<ResearchRequest>>,
}

impl MockResearch {
    pub fn answering(text: impl Into<String>) -> Arc<Self> {
        Self::with_answer(ResearchAnswer::answered(text))
    }

    pub fn failing(fallback: &str) -> Arc<Self> {
        Self::with_answer(ResearchAnswer::fallback(fallback, "HTTP 503"))
    }

    fn with_answer(answer: ResearchAnswer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ResearchRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ResearchBackend for MockResearch {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_answer(&self, req: &ResearchRequest) -> ResearchAnswer {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req.clone());
        self.answer.clone()
    }
}

/// Config with the two demo API keys plus `extra` TOML appended.
pub fn config(extra: &str) -> RelayConfig {
    let toml = format!(
        r#"
[[auth.keys]]
key = "{WEBHOOK_KEY}"
scope = "webhook"

[[auth.keys]]
key = "{INTEGRATION_KEY}"
scope = "generic"
secret = "{INTEGRATION_SECRET}"

{extra}
"#
    );
    RelayConfig::from_toml_str(&toml).unwrap()
}

/// `[channels.whatsapp]` section pointing its Graph API at `api_base`.
pub fn whatsapp_section(api_base: &str) -> String {
    format!(
        r#"
[channels.whatsapp]
verify_token = "{WA_VERIFY_TOKEN}"
app_secret = "{WA_APP_SECRET}"
access_token = "wa-access-token"
phone_number_id = "PNID"
api_base_url = "{api_base}"
send_timeout_secs = 5
"#
    )
}

/// `[channels.telegram]` section pointing the Bot API at `api_base`.
pub fn telegram_section(api_base: &str) -> String {
    format!(
        r#"
[channels.telegram]
bot_token = "{TG_TOKEN}"
api_base_url = "{api_base}"
bot_username = "relay_bot"
send_timeout_secs = 5
"#
    )
}

pub fn fanout_section(urls: &[String]) -> String {
    format!("[fanout]\nurls = \"{}\"\ntimeout_secs = 2\n", urls.join(","))
}

/// Create a test app over `config` with a mock research backend.
pub fn test_app(config: RelayConfig, research: Arc<MockResearch>) -> Router {
    let state = Arc::new(AppState::new(config, research));
    build_router(state)
}

/// Send `req` and decode the body as JSON (`Null` when it is not JSON).
pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send_raw(app, req).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn send_raw(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

/// JSON POST to `uri` with optional extra headers.
pub fn post_json(uri: &str, body: impl Into<String>, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(body.into())).unwrap()
}
