//! WhatsApp Business Cloud API adapter.
//!
//! Inbound payloads are walked as `entry[].changes[].value.messages[]`; only
//! messages of type `text` with a non-empty body become [`InboundMessage`]s.
//! Replies go out through `POST {api_base}/{phone_number_id}/messages`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use relay_core::{
    config::WhatsAppConfig, ChannelKind, Chunk, DeliveryAttempt, Inbound, InboundMessage,
};

use crate::{
    channel::ChannelAdapter, delivery::attempt_request, error::ChannelError,
    format::MarkupDialect, retry::RetryPolicy,
};

/// Maximum characters per WhatsApp text message.
pub const WHATSAPP_MAX_MESSAGE_LEN: usize = 4096;

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
struct Change {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    metadata: Option<PhoneMetadata>,
    #[serde(default)]
    contacts: Vec<Contact>,
    #[serde(default)]
    messages: Vec<WaMessage>,
}

#[derive(Debug, Deserialize)]
struct PhoneMetadata {
    #[serde(default)]
    phone_number_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Contact {
    #[serde(default)]
    wa_id: String,
    #[serde(default)]
    profile: Option<Profile>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct WaMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    from: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(rename = "type", default)]
    message_type: String,
    #[serde(default)]
    text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    #[serde(default)]
    body: String,
}

impl WaMessage {
    fn text_body(&self) -> Option<&str> {
        if self.message_type != "text" {
            return None;
        }
        self.text
            .as_ref()
            .map(|t| t.body.as_str())
            .filter(|b| !b.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: SendTextBody<'a>,
}

#[derive(Debug, Serialize)]
struct SendTextBody<'a> {
    body: &'a str,
}

pub struct WhatsAppAdapter {
    client: reqwest::Client,
    config: WhatsAppConfig,
    retry: RetryPolicy,
}

impl WhatsAppAdapter {
    pub fn new(config: WhatsAppConfig, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            retry,
        }
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!(
            "{}/{}/messages",
            self.config.api_base_url.trim_end_matches('/'),
            phone_number_id
        )
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppAdapter {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Whatsapp
    }

    fn parse_inbound(&self, payload: &Value) -> Result<Vec<Inbound>, ChannelError> {
        let parsed: WebhookPayload = serde_json::from_value(payload.clone()).map_err(|e| {
            ChannelError::MalformedPayload(format!("unexpected whatsapp payload shape: {e}"))
        })?;

        let mut out = Vec::new();
        for change in parsed.entry.into_iter().flat_map(|e| e.changes) {
            let value = change.value;
            let phone_number_id = value.metadata.and_then(|m| m.phone_number_id);
            let names: HashMap<&str, &str> = value
                .contacts
                .iter()
                .filter_map(|c| c.profile.as_ref().map(|p| (c.wa_id.as_str(), p.name.as_str())))
                .collect();

            for msg in &value.messages {
                let Some(text) = msg.text_body() else {
                    debug!(msg_type = %msg.message_type, from = %msg.from, "whatsapp: skipping non-text message");
                    continue;
                };

                let inbound = InboundMessage::new(
                    ChannelKind::Whatsapp,
                    msg.from.clone(),
                    msg.from.clone(),
                    text,
                    payload.clone(),
                )
                .with_metadata("message_id", msg.id.clone())
                .with_metadata("timestamp", msg.timestamp.clone())
                .with_metadata("phone_number_id", phone_number_id.clone())
                .with_metadata(
                    "contact_name",
                    names.get(msg.from.as_str()).map(|n| n.to_string()),
                );
                out.push(Inbound::Message(inbound));
            }
        }
        Ok(out)
    }

    async fn send_outbound(&self, target_id: &str, chunks: &[Chunk]) -> Vec<DeliveryAttempt> {
        let target = format!("whatsapp:{target_id}");
        let (Some(token), Some(phone_number_id)) = (
            self.config.access_token.as_deref().filter(|t| !t.is_empty()),
            self.config.phone_number_id.as_deref().filter(|p| !p.is_empty()),
        ) else {
            warn!("whatsapp: access_token or phone_number_id missing, cannot reply");
            return chunks
                .iter()
                .map(|_| DeliveryAttempt::failed(&target, None, "whatsapp credentials not configured"))
                .collect();
        };

        let url = self.messages_url(phone_number_id);
        let timeout = Duration::from_secs(self.config.send_timeout_secs);
        let mut attempts = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let body = SendTextRequest {
                messaging_product: "whatsapp",
                to: target_id,
                message_type: "text",
                text: SendTextBody { body: &chunk.text },
            };
            let attempt = self
                .retry
                .run(|| {
                    let request = self
                        .client
                        .post(&url)
                        .bearer_auth(token)
                        .timeout(timeout)
                        .json(&body);
                    attempt_request(request, &target)
                })
                .await;
            debug!(to = %target_id, index = chunk.index, total = chunk.total_count, ok = attempt.succeeded, "whatsapp: chunk sent");
            attempts.push(attempt);
        }
        attempts
    }

    fn max_message_length(&self) -> Option<usize> {
        Some(WHATSAPP_MAX_MESSAGE_LEN)
    }

    fn dialect(&self) -> MarkupDialect {
        MarkupDialect::Whatsapp
    }
}
