//! Generic webhook channel.
//!
//! Producers POST `{type, message, user_id, source_system, channel_id,
//! metadata}`. There is no outbound API: the answer travels back in the HTTP
//! response, so [`WebhookAdapter::send_outbound`] only records that the
//! chunks were handed over inline.

use async_trait::async_trait;
use serde_json::{Map, Value};

use relay_core::{ChannelKind, Chunk, DeliveryAttempt, Inbound, InboundMessage};

use crate::{channel::ChannelAdapter, error::ChannelError};

pub const DEFAULT_WEBHOOK_TYPE: &str = "message";
pub const DEFAULT_USER_ID: &str = "webhook_user";
pub const DEFAULT_SOURCE_SYSTEM: &str = "external";
pub const DEFAULT_CHANNEL_ID: &str = "webhook";

/// A generic webhook body with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEnvelope {
    pub webhook_type: String,
    pub message: String,
    pub user_id: String,
    pub source_system: String,
    pub channel_id: String,
    pub metadata: Value,
    /// Requested markup dialect for the answer, if any.
    pub platform: Option<String>,
    pub event_type: String,
    pub raw: Value,
}

impl WebhookEnvelope {
    /// Validate `payload` and fill in defaults.
    ///
    /// `message` is required for every webhook type.
    pub fn parse(payload: &Value) -> Result<Self, ChannelError> {
        let obj = payload.as_object().ok_or_else(|| {
            ChannelError::MalformedPayload("Webhook payload must be a JSON object".into())
        })?;

        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                ChannelError::MalformedPayload("Message is required in webhook payload".into())
            })?;

        Ok(Self {
            webhook_type: string_or(obj, "type", DEFAULT_WEBHOOK_TYPE),
            message: message.to_string(),
            user_id: string_or(obj, "user_id", DEFAULT_USER_ID),
            source_system: string_or(obj, "source_system", DEFAULT_SOURCE_SYSTEM),
            channel_id: string_or(obj, "channel_id", DEFAULT_CHANNEL_ID),
            metadata: obj
                .get("metadata")
                .filter(|m| m.is_object())
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
            platform: obj
                .get("platform")
                .and_then(Value::as_str)
                .filter(|p| !p.is_empty())
                .map(String::from),
            event_type: string_or(obj, "event_type", ""),
            raw: payload.clone(),
        })
    }

    pub fn is_message(&self) -> bool {
        self.webhook_type == DEFAULT_WEBHOOK_TYPE
    }

    /// Top-level keys of the original body.
    pub fn data_keys(&self) -> Vec<String> {
        self.raw
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Normalized message carrying the caller's metadata plus `source_system`
    /// and `webhook_type`.
    pub fn to_inbound(&self) -> InboundMessage {
        InboundMessage::new(
            ChannelKind::Webhook,
            self.user_id.clone(),
            self.channel_id.clone(),
            self.message.clone(),
            self.raw.clone(),
        )
        .with_metadata_object(&self.metadata)
        .with_metadata("source_system", self.source_system.clone())
        .with_metadata("webhook_type", "incoming")
        .with_metadata("platform", self.platform.clone())
    }
}

/// Non-string values are rendered as JSON text; absent or null fields take `default`.
fn string_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct WebhookAdapter;

impl WebhookAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChannelAdapter for WebhookAdapter {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Webhook
    }

    /// Only `type = "message"` bodies reach the research backend.
    fn parse_inbound(&self, payload: &Value) -> Result<Vec<Inbound>, ChannelError> {
        let envelope = WebhookEnvelope::parse(payload)?;
        if !envelope.is_message() {
            return Ok(Vec::new());
        }
        Ok(vec![Inbound::Message(envelope.to_inbound())])
    }

    async fn send_outbound(&self, target_id: &str, chunks: &[Chunk]) -> Vec<DeliveryAttempt> {
        chunks
            .iter()
            .map(|_| DeliveryAttempt::delivered(format!("inline:{target_id}"), None))
            .collect()
    }

    fn max_message_length(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_fields() {
        let env = WebhookEnvelope::parse(&json!({"message": "x"})).unwrap();
        assert_eq!(env.webhook_type, "message");
        assert_eq!(env.user_id, "webhook_user");
        assert_eq!(env.source_system, "external");
        assert_eq!(env.channel_id, "webhook");
        assert_eq!(env.metadata, json!({}));
        assert!(env.platform.is_none());
        assert!(env.is_message());
    }

    #[test]
    fn message_is_required_for_every_type() {
        for body in [
            json!({}),
            json!({"message": ""}),
            json!({"type": "event", "event_type": "user_action"}),
            json!({"message": 42}),
        ] {
            let err = WebhookEnvelope::parse(&body).unwrap_err();
            assert_eq!(err.to_string(), "Message is required in webhook payload");
        }
    }

    #[test]
    fn non_object_body_is_malformed() {
        assert!(matches!(
            WebhookEnvelope::parse(&json!(["message"])),
            Err(ChannelError::MalformedPayload(_))
        ));
    }

    #[test]
    fn inbound_carries_source_and_caller_metadata() {
        let env = WebhookEnvelope::parse(&json!({
            "message": "find papers",
            "user_id": "u-9",
            "source_system": "crm",
            "channel_id": "sales",
            "metadata": {"ticket": 17},
            "platform": "whatsapp"
        }))
        .unwrap();
        let msg = env.to_inbound();
        assert_eq!(msg.channel, ChannelKind::Webhook);
        assert_eq!(msg.sender_id, "u-9");
        assert_eq!(msg.channel_id, "sales");
        assert_eq!(msg.metadata["ticket"], 17);
        assert_eq!(msg.metadata["source_system"], "crm");
        assert_eq!(msg.metadata["webhook_type"], "incoming");
        assert_eq!(msg.metadata["platform"], "whatsapp");
    }

    #[test]
    fn data_keys_list_top_level_fields() {
        let env = WebhookEnvelope::parse(&json!({"type": "ping", "message": "m", "extra": 1})).unwrap();
        let mut keys = env.data_keys();
        keys.sort();
        assert_eq!(keys, ["extra", "message", "type"]);
    }

    #[test]
    fn adapter_only_emits_message_type() {
        let a = WebhookAdapter::new();
        assert_eq!(a.parse_inbound(&json!({"message": "x"})).unwrap().len(), 1);
        assert!(a
            .parse_inbound(&json!({"type": "event", "message": "x"}))
            .unwrap()
            .is_empty());
        assert_eq!(a.max_message_length(), None);
    }

    #[tokio::test]
    async fn replies_are_delivered_inline() {
        let a = WebhookAdapter::new();
        let chunks = crate::chunk::chunk_for("answer", a.max_message_length());
        let attempts = a.send_outbound("webhook", &chunks).await;
        assert_eq!(attempts.len(), 1);
        assert!(attempts[0].succeeded);
        assert_eq!(attempts[0].target, "inline:webhook");
    }
}
