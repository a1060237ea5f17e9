use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use relay_core::{config::ResearchConfig, ResearchAnswer};

use crate::backend::{ResearchBackend, ResearchRequest};
use crate::error::ResearchError;

/// Sent when the backend answers with an error or an unsuccessful status.
pub const TROUBLE_PROCESSING: &str =
    "I'm having trouble processing your request right now. Please try again later.";

/// Sent when the backend cannot be reached or its answer cannot be read.
pub const TECHNICAL_DIFFICULTIES: &str =
    "I'm experiencing technical difficulties. Please try again.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    response: String,
}

/// Research backend reached over HTTP (`POST <url>` with `X-API-Key`).
pub struct HttpResearchClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpResearchClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout,
        }
    }

    pub fn from_config(cfg: &ResearchConfig) -> Self {
        Self::new(
            cfg.url.clone(),
            cfg.api_key.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    async fn request(&self, req: &ResearchRequest) -> Result<String, ResearchError> {
        let mut builder = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(req);
        if let Some(key) = req.auth_token.as_deref().or(self.api_key.as_deref()) {
            builder = builder.header("X-API-Key", key);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        if status != 200 {
            let text = resp.text().await.unwrap_or_default();
            return Err(ResearchError::Api {
                status,
                message: text.chars().take(200).collect(),
            });
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ResearchError::Parse(e.to_string()))?;
        if body.status != "success" {
            return Err(ResearchError::Unsuccessful(body.status));
        }
        Ok(body.response)
    }
}

#[async_trait]
impl ResearchBackend for HttpResearchClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_answer(&self, req: &ResearchRequest) -> ResearchAnswer {
        debug!(platform = %req.platform, channel_id = %req.channel_id, "forwarding to research backend");
        match self.request(req).await {
            Ok(text) => ResearchAnswer::answered(text),
            Err(e) => {
                warn!(error = %e, platform = %req.platform, "research backend failed, using fallback");
                let fallback = if e.is_backend_refusal() {
                    TROUBLE_PROCESSING
                } else {
                    TECHNICAL_DIFFICULTIES
                };
                ResearchAnswer::fallback(fallback, e.to_string())
            }
        }
    }
}
