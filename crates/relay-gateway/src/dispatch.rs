//! Outbound side of an exchange: format, chunk, reply, fan out.

use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use reqwest::header::USER_AGENT;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use relay_channels::{chunk_for, delivery::attempt_request, ChannelAdapter, MarkupDialect, RetryPolicy};
use relay_core::{
    config::RelayConfig, Chunk, DeliveryAttempt, FormattedAnswer, InboundMessage, ResearchAnswer,
    WebhookSubscription,
};

/// Body POSTed to every fan-out subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct FanoutEnvelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub original_message: String,
    pub response: String,
    pub user_id: String,
    pub source_system: String,
    pub channel_id: String,
    pub metadata: Map<String, Value>,
    pub webhook_timestamp: i64,
}

impl FanoutEnvelope {
    /// `source_system` comes from the message metadata, else the channel name.
    pub fn new(message: &InboundMessage, response: &str) -> Self {
        let source_system = message
            .metadata
            .get("source_system")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| message.channel.to_string());

        Self {
            kind: "research_response",
            original_message: message.text.clone(),
            response: response.to_string(),
            user_id: message.sender_id.clone(),
            source_system,
            channel_id: message.channel_id.clone(),
            metadata: message.metadata.clone(),
            webhook_timestamp: Utc::now().timestamp(),
        }
    }
}

/// Rewrite `answer` for `adapter`, or for `dialect` when the caller asked for one.
pub fn format_answer(
    adapter: &dyn ChannelAdapter,
    answer: &ResearchAnswer,
    dialect: Option<MarkupDialect>,
) -> FormattedAnswer {
    let text = match dialect {
        Some(d) => d.rewrite(&answer.text),
        None => adapter.rewrite_markup(&answer.text),
    };
    FormattedAnswer { text }
}

/// Split `formatted` to the adapter's length limit.
pub fn chunk_answer(adapter: &dyn ChannelAdapter, formatted: &FormattedAnswer) -> Vec<Chunk> {
    chunk_for(&formatted.text, adapter.max_message_length())
}

/// Send every chunk to `target_id`. One attempt per chunk, in index order.
pub async fn deliver_reply(
    adapter: &dyn ChannelAdapter,
    target_id: &str,
    chunks: &[Chunk],
) -> Vec<DeliveryAttempt> {
    let attempts = adapter.send_outbound(target_id, chunks).await;
    let failed = attempts.iter().filter(|a| !a.succeeded).count();
    if failed > 0 {
        warn!(channel = %adapter.kind(), target_id, failed, total = attempts.len(), "reply partially undelivered");
    } else {
        debug!(channel = %adapter.kind(), target_id, chunks = attempts.len(), "reply delivered");
    }
    attempts
}

/// Fan-out to the configured subscriber URLs.
pub struct Dispatcher {
    client: reqwest::Client,
    subscriptions: Vec<WebhookSubscription>,
    timeout: Duration,
    user_agent: String,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub fn new(
        subscriptions: Vec<WebhookSubscription>,
        timeout: Duration,
        user_agent: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            subscriptions,
            timeout,
            user_agent: user_agent.into(),
            retry,
        }
    }

    pub fn from_config(cfg: &RelayConfig) -> Self {
        Self::new(
            cfg.fanout.subscriptions(),
            Duration::from_secs(cfg.fanout.timeout_secs),
            cfg.fanout.user_agent.clone(),
            RetryPolicy::from_config(&cfg.delivery.retry),
        )
    }

    pub fn subscriptions(&self) -> &[WebhookSubscription] {
        &self.subscriptions
    }

    /// POST `envelope` to every subscriber in parallel.
    ///
    /// Each URL gets its own [`DeliveryAttempt`]; a failing subscriber never
    /// affects the others.
    pub async fn fan_out(&self, envelope: &FanoutEnvelope) -> Vec<DeliveryAttempt> {
        if self.subscriptions.is_empty() {
            return Vec::new();
        }

        let sends = self.subscriptions.iter().map(|sub| {
            self.retry.run(move || {
                let request = self
                    .client
                    .post(&sub.url)
                    .header(USER_AGENT, &self.user_agent)
                    .timeout(self.timeout)
                    .json(envelope);
                attempt_request(request, &sub.url)
            })
        });
        let attempts = join_all(sends).await;

        let failed = attempts.iter().filter(|a| !a.succeeded).count();
        info!(targets = attempts.len(), failed, "fan-out complete");
        attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_channels::WebhookAdapter;
    use relay_core::ChannelKind;
    use serde_json::json;

    #[test]
    fn envelope_prefers_metadata_source_system() {
        let msg = InboundMessage::new(ChannelKind::Webhook, "u1", "sales", "q", json!({}))
            .with_metadata("source_system", "crm");
        let env = FanoutEnvelope::new(&msg, "answer");
        assert_eq!(env.source_system, "crm");
        assert_eq!(env.kind, "research_response");
        assert_eq!(env.original_message, "q");

        let body = serde_json::to_value(&env).unwrap();
        assert_eq!(body["type"], "research_response");
        assert_eq!(body["metadata"]["source_system"], "crm");
        assert!(body["webhook_timestamp"].is_i64());
    }

    #[test]
    fn envelope_falls_back_to_channel_name() {
        let msg = InboundMessage::new(ChannelKind::Telegram, "7", "7", "q", json!({}));
        assert_eq!(FanoutEnvelope::new(&msg, "a").source_system, "telegram");
    }

    #[test]
    fn explicit_dialect_overrides_adapter() {
        let adapter = WebhookAdapter::new();
        let answer = ResearchAnswer::answered("## Title\n**bold** [docs](https://x.io)");

        let plain = format_answer(&adapter, &answer, None);
        assert_eq!(plain.text, answer.text);

        let wa = format_answer(&adapter, &answer, Some(MarkupDialect::Whatsapp));
        assert_eq!(wa.text, "*Title\n*bold* docs");
    }

    #[test]
    fn unbounded_adapters_get_one_chunk() {
        let adapter = WebhookAdapter::new();
        let formatted = FormattedAnswer {
            text: "x".repeat(10_000),
        };
        let chunks = chunk_answer(&adapter, &formatted);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.len(), 10_000);
    }

    #[tokio::test]
    async fn no_subscribers_means_no_attempts() {
        let d = Dispatcher::new(Vec::new(), Duration::from_secs(1), "ua", RetryPolicy::single());
        let msg = InboundMessage::new(ChannelKind::Telegram, "7", "7", "q", json!({}));
        assert!(d.fan_out(&FanoutEnvelope::new(&msg, "a")).await.is_empty());
    }
}
