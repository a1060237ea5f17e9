use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use relay_core::{ChannelKind, InboundMessage, ResearchAnswer};

/// Body sent to the research backend.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchRequest {
    pub message: String,
    pub platform: ChannelKind,
    pub user_id: String,
    pub channel_id: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Overrides the configured backend key for this call.
    #[serde(skip)]
    pub auth_token: Option<String>,
}

impl ResearchRequest {
    /// Build the request for `msg`.
    ///
    /// Generic webhook conversations are keyed as `<source_system>_<channel_id>`
    /// so that two producers using the same channel name stay apart. Their
    /// metadata is cut down to `source_system` and `webhook_type`; the
    /// caller's own metadata stays in the gateway.
    pub fn from_message(msg: &InboundMessage) -> Self {
        let (channel_id, metadata) = match msg.channel {
            ChannelKind::Webhook | ChannelKind::Generic => {
                let source = msg
                    .metadata
                    .get("source_system")
                    .and_then(Value::as_str)
                    .unwrap_or("external");
                let mut metadata = Map::new();
                metadata.insert("source_system".into(), Value::from(source));
                metadata.insert("webhook_type".into(), Value::from("incoming"));
                (format!("{source}_{}", msg.channel_id), metadata)
            }
            _ => (msg.channel_id.clone(), msg.metadata.clone()),
        };

        Self {
            message: msg.text.clone(),
            platform: msg.channel,
            user_id: msg.sender_id.clone(),
            channel_id,
            metadata,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into()).filter(|t: &String| !t.is_empty());
        self
    }
}

/// Anything that can answer a question for the gateway.
///
/// Implementations must not fail: every error is folded into a
/// [`ResearchAnswer`] with `succeeded = false` and fallback text.
#[async_trait]
pub trait ResearchBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_answer(&self, req: &ResearchRequest) -> ResearchAnswer;
}
