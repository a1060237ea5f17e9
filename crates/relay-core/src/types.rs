use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one exchange. UUIDv7, so ids sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExchangeId(pub String);

impl ExchangeId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The external messaging surfaces the gateway understands.
///
/// Also used as the scope of a [`Credential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Whatsapp,
    Telegram,
    Webhook,
    Generic,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Whatsapp => "whatsapp",
            ChannelKind::Telegram => "telegram",
            ChannelKind::Webhook => "webhook",
            ChannelKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "whatsapp" => Ok(ChannelKind::Whatsapp),
            "telegram" => Ok(ChannelKind::Telegram),
            "webhook" => Ok(ChannelKind::Webhook),
            "generic" => Ok(ChannelKind::Generic),
            other => Err(format!("unknown channel: {}", other)),
        }
    }
}

/// An API key known to the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub key: String,
    pub scope: ChannelKind,
    /// Dedicated signing secret; when absent the webhook secret is derived from the key.
    #[serde(default, rename = "secret")]
    pub issued_secret: Option<String>,
}

impl Credential {
    /// A credential with an empty key is never valid.
    pub fn is_valid(&self) -> bool {
        !self.key.is_empty()
    }
}

/// Answer returned by the research backend, or the fallback text that replaced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchAnswer {
    pub text: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ResearchAnswer {
    pub fn answered(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn fallback(text: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Answer text rewritten for a channel's markup dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedAnswer {
    pub text: String,
}

/// One segment of an outbound message. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub total_count: usize,
    pub text: String,
}

/// A fan-out target read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub url: String,
}

/// Outcome of a single send: one per reply chunk and one per fan-out target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryAttempt {
    pub target: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryAttempt {
    pub fn delivered(target: impl Into<String>, http_status: Option<u16>) -> Self {
        Self {
            target: target.into(),
            succeeded: true,
            http_status,
            error: None,
        }
    }

    pub fn failed(
        target: impl Into<String>,
        http_status: Option<u16>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            succeeded: false,
            http_status,
            error: Some(error.into()),
        }
    }
}

/// Progress of one exchange through the pipeline. Used for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStage {
    Received,
    Authenticated,
    Parsed,
    Forwarded,
    Answered,
    ForwardFailed,
    Fallback,
    Formatted,
    Chunked,
    Delivered,
    Rejected,
}

impl ExchangeStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangeStage::Delivered | ExchangeStage::Rejected)
    }
}

impl fmt::Display for ExchangeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExchangeStage::Received => "received",
            ExchangeStage::Authenticated => "authenticated",
            ExchangeStage::Parsed => "parsed",
            ExchangeStage::Forwarded => "forwarded",
            ExchangeStage::Answered => "answered",
            ExchangeStage::ForwardFailed => "forward_failed",
            ExchangeStage::Fallback => "fallback",
            ExchangeStage::Formatted => "formatted",
            ExchangeStage::Chunked => "chunked",
            ExchangeStage::Delivered => "delivered",
            ExchangeStage::Rejected => "rejected",
        };
        f.write_str(s)
    }
}
