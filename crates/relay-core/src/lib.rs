pub mod config;
pub mod error;
pub mod message;
pub mod types;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use message::{CannedReply, Inbound, InboundMessage, QueryAck};
pub use types::{
    ChannelKind, Chunk, Credential, DeliveryAttempt, ExchangeId, ExchangeStage, FormattedAnswer,
    ResearchAnswer, WebhookSubscription,
};
