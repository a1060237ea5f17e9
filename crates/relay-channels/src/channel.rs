use async_trait::async_trait;
use serde_json::Value;

use relay_core::{ChannelKind, Chunk, DeliveryAttempt, Inbound, QueryAck};

use crate::{error::ChannelError, format::MarkupDialect};

/// Common interface implemented by every channel adapter (WhatsApp, Telegram, generic webhook).
///
/// Implementations must be `Send + Sync` so they can be stored in an
/// [`AdapterRegistry`](crate::registry::AdapterRegistry) and driven from
/// many request tasks at once.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Which channel this adapter serves. Used as the registry key.
    fn kind(&self) -> ChannelKind;

    /// Split one wire payload into the items it carries.
    ///
    /// Payload entries the adapter does not handle are skipped, not errors.
    fn parse_inbound(&self, payload: &Value) -> Result<Vec<Inbound>, ChannelError>;

    /// Deliver `chunks` to `target_id` in index order.
    ///
    /// Every chunk gets exactly one [`DeliveryAttempt`]; a failed chunk does
    /// not stop the ones after it.
    async fn send_outbound(&self, target_id: &str, chunks: &[Chunk]) -> Vec<DeliveryAttempt>;

    /// Longest text a single outbound message may carry. `None` disables chunking.
    fn max_message_length(&self) -> Option<usize>;

    /// Markup dialect the channel renders.
    fn dialect(&self) -> MarkupDialect {
        MarkupDialect::Passthrough
    }

    /// Rewrite markdown answer text for this channel.
    fn rewrite_markup(&self, text: &str) -> String {
        self.dialect().rewrite(text)
    }

    /// Acknowledge an interactive query. Channels without queries return `None`.
    async fn answer_query(&self, _query: &QueryAck) -> Option<DeliveryAttempt> {
        None
    }

    /// Show a "working on it" indicator before a slow answer. Best-effort.
    async fn signal_typing(&self, _target_id: &str) {}
}
