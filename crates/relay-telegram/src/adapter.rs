//! Telegram channel adapter.
//!
//! Updates arrive on the gateway's webhook route; the adapter turns them
//! into [`Inbound`] items and talks back through the Bot API. Exactly one of
//! `message`, `callback_query` or `inline_query` is handled per update, in
//! that order of precedence.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use relay_channels::{ChannelAdapter, ChannelError, MarkupDialect, RetryPolicy};
use relay_core::{
    config::TelegramConfig, CannedReply, ChannelKind, Chunk, DeliveryAttempt, Inbound,
    InboundMessage, QueryAck,
};

use crate::api::{InlineArticle, TelegramApi};
use crate::commands::{self, CommandAction};
use crate::error::TelegramError;
use crate::update::{CallbackQuery, InlineQuery, Message, Update};

/// Telegram's hard limit per message.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Chunk body size. The `(i/n)\n\n` prefix on later chunks is added on top,
/// so a full second chunk is 4097 chars, past [`TELEGRAM_MESSAGE_LIMIT`].
pub const CHUNK_MAX: usize = 4090;

const CALLBACK_RESEARCH_PREFIX: &str = "research_";

pub struct TelegramAdapter {
    api: TelegramApi,
    bot_username: Option<String>,
    retry: RetryPolicy,
}

impl TelegramAdapter {
    pub fn new(config: &TelegramConfig, retry: RetryPolicy) -> Result<Self, TelegramError> {
        if config.bot_token.trim().is_empty() {
            return Err(TelegramError::NoToken);
        }
        let api = TelegramApi::new(
            &config.bot_token,
            &config.api_base_url,
            Duration::from_secs(config.send_timeout_secs),
        );
        Ok(Self {
            api,
            bot_username: config.bot_username.clone().filter(|u| !u.is_empty()),
            retry,
        })
    }

    fn parse_message(&self, msg: &Message, raw: &Value) -> Option<Inbound> {
        let chat_id = msg.chat_id()?.to_string();
        let text = msg.text()?;
        let from = msg.from.as_ref();

        if from.is_some_and(|u| u.is_bot) {
            debug!(chat_id = %chat_id, "telegram: ignoring message from a bot");
            return None;
        }

        let sender_id = from.map(|u| u.id.to_string()).unwrap_or_else(|| chat_id.clone());
        let username = from.and_then(|u| u.username.as_deref());

        let question = match commands::parse(text, self.bot_username.as_deref()) {
            None => text,
            Some(cmd) => match cmd.action(username) {
                CommandAction::Reply(reply) => {
                    return Some(Inbound::Reply(CannedReply {
                        channel: ChannelKind::Telegram,
                        channel_id: chat_id,
                        text: reply,
                    }));
                }
                CommandAction::Research(q) => q,
                CommandAction::Ignore => {
                    debug!(chat_id = %chat_id, text, "telegram: ignoring unknown command");
                    return None;
                }
            },
        };

        let inbound = InboundMessage::new(
            ChannelKind::Telegram,
            sender_id,
            chat_id,
            question,
            raw.clone(),
        )
        .with_metadata("message_id", msg.message_id)
        .with_metadata("username", username.map(String::from))
        .with_metadata(
            "chat_type",
            msg.chat.as_ref().and_then(|c| c.chat_type.clone()),
        );
        Some(Inbound::Message(inbound))
    }

    fn parse_callback(&self, cb: &CallbackQuery, raw: &Value) -> Vec<Inbound> {
        let mut out = vec![Inbound::Query(QueryAck::Callback { id: cb.id.clone() })];

        let topic = cb
            .data
            .as_deref()
            .and_then(|d| d.strip_prefix(CALLBACK_RESEARCH_PREFIX))
            .map(|t| t.replace('_', " "))
            .filter(|t| !t.trim().is_empty());
        let chat_id = cb.message.as_ref().and_then(Message::chat_id);

        if let (Some(topic), Some(chat_id)) = (topic, chat_id) {
            let sender_id = cb
                .from
                .as_ref()
                .map(|u| u.id.to_string())
                .unwrap_or_else(|| chat_id.to_string());
            let inbound = InboundMessage::new(
                ChannelKind::Telegram,
                sender_id,
                chat_id.to_string(),
                topic,
                raw.clone(),
            )
            .with_metadata("callback_query_id", cb.id.clone());
            out.push(Inbound::Message(inbound));
        }
        out
    }

    fn parse_inline(&self, iq: &InlineQuery) -> Vec<Inbound> {
        if iq.query.trim().is_empty() {
            return Vec::new();
        }
        vec![Inbound::Query(QueryAck::Inline {
            id: iq.id.clone(),
            query: iq.query.clone(),
        })]
    }

    /// Send one chunk as Markdown, retrying as plain text if Telegram rejects the markup.
    async fn deliver_chunk(&self, chat_id: &str, text: &str) -> DeliveryAttempt {
        let target = format!("telegram:{chat_id}");
        let sent = match self.api.send_message(chat_id, text, Some("Markdown")).await {
            Err(e) if e.is_rejected_markup() => {
                debug!(chat_id, "telegram: markdown rejected, resending as plain text");
                self.api.send_message(chat_id, text, None).await
            }
            other => other,
        };
        match sent {
            Ok(status) => DeliveryAttempt::delivered(target, Some(status)),
            Err(e) => DeliveryAttempt::failed(target, e.status(), e.to_string()),
        }
    }
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    fn parse_inbound(&self, payload: &Value) -> Result<Vec<Inbound>, ChannelError> {
        let update: Update = serde_json::from_value(payload.clone()).map_err(|e| {
            ChannelError::MalformedPayload(format!("unexpected telegram update shape: {e}"))
        })?;

        if let Some(msg) = &update.message {
            return Ok(self.parse_message(msg, payload).into_iter().collect());
        }
        if let Some(cb) = &update.callback_query {
            return Ok(self.parse_callback(cb, payload));
        }
        if let Some(iq) = &update.inline_query {
            return Ok(self.parse_inline(iq));
        }
        debug!(update_id = ?update.update_id, "telegram: update carries nothing we handle");
        Ok(Vec::new())
    }

    async fn send_outbound(&self, target_id: &str, chunks: &[Chunk]) -> Vec<DeliveryAttempt> {
        let mut attempts = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let attempt = self
                .retry
                .run(|| self.deliver_chunk(target_id, &chunk.text))
                .await;
            if !attempt.succeeded {
                warn!(
                    chat_id = target_id,
                    index = chunk.index,
                    total = chunk.total_count,
                    error = attempt.error.as_deref().unwrap_or(""),
                    "telegram: chunk not delivered"
                );
            }
            attempts.push(attempt);
        }
        attempts
    }

    fn max_message_length(&self) -> Option<usize> {
        Some(CHUNK_MAX)
    }

    fn dialect(&self) -> MarkupDialect {
        MarkupDialect::Telegram
    }

    async fn answer_query(&self, query: &QueryAck) -> Option<DeliveryAttempt> {
        let (target, result) = match query {
            QueryAck::Callback { id } => (
                format!("telegram:callback:{id}"),
                self.api.answer_callback_query(id, None).await,
            ),
            QueryAck::Inline { id, query } => (
                format!("telegram:inline:{id}"),
                self.api
                    .answer_inline_query(id, &[InlineArticle::research(query)])
                    .await,
            ),
        };
        Some(match result {
            Ok(status) => DeliveryAttempt::delivered(target, Some(status)),
            Err(e) => DeliveryAttempt::failed(target, e.status(), e.to_string()),
        })
    }

    async fn signal_typing(&self, target_id: &str) {
        if let Err(e) = self.api.send_chat_action(target_id, "typing").await {
            debug!(chat_id = target_id, error = %e, "telegram: typing indicator failed");
        }
    }
}
