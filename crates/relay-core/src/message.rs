//! Channel-agnostic inbound records.
//!
//! Adapters turn one wire payload into zero or more [`Inbound`] items. Only
//! [`Inbound::Message`] reaches the research backend; the other variants are
//! answered locally by the adapter that produced them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::ChannelKind;

/// A normalized message received from an external channel.
#[derive(Debug, Clone, Serialize)]
pub struct InboundMessage {
    pub channel: ChannelKind,

    /// Platform-native identifier for the sender (phone number, user ID, …).
    pub sender_id: String,

    /// Where replies go: chat ID for Telegram, phone number for WhatsApp,
    /// caller-supplied channel for generic webhooks.
    pub channel_id: String,

    pub text: String,

    pub received_at: DateTime<Utc>,

    /// The wire payload this message was cut from.
    pub raw: Value,

    pub metadata: Map<String, Value>,
}

impl InboundMessage {
    pub fn new(
        channel: ChannelKind,
        sender_id: impl Into<String>,
        channel_id: impl Into<String>,
        text: impl Into<String>,
        raw: Value,
    ) -> Self {
        Self {
            channel,
            sender_id: sender_id.into(),
            channel_id: channel_id.into(),
            text: text.into(),
            received_at: Utc::now(),
            raw,
            metadata: Map::new(),
        }
    }

    /// Attach one metadata entry. Null values are dropped.
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.metadata.insert(key.to_string(), value);
        }
        self
    }

    /// Merge an object of metadata; non-object values are ignored.
    pub fn with_metadata_object(mut self, extra: &Value) -> Self {
        if let Some(obj) = extra.as_object() {
            for (k, v) in obj {
                self.metadata.insert(k.clone(), v.clone());
            }
        }
        self
    }
}

/// A reply decided without the research backend (bot commands, usage hints).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedReply {
    pub channel: ChannelKind,
    pub channel_id: String,
    pub text: String,
}

/// Interactive query that must be acknowledged through the channel API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAck {
    /// Inline-button press; acknowledging dismisses the client's spinner.
    Callback { id: String },
    /// Inline-mode search; answered with a single article result.
    Inline { id: String, query: String },
}

/// One item parsed out of a channel payload.
#[derive(Debug, Clone)]
pub enum Inbound {
    Message(InboundMessage),
    Reply(CannedReply),
    Query(QueryAck),
}

impl Inbound {
    pub fn as_message(&self) -> Option<&InboundMessage> {
        match self {
            Inbound::Message(m) => Some(m),
            _ => None,
        }
    }
}
