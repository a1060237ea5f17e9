//! One exchange: research, format, chunk, then reply and fan-out together.
//!
//! Exchanges run in a spawned task that the HTTP handler awaits, so a
//! dropped client connection does not cut delivery short.

use std::sync::Arc;

use tracing::{debug, info, warn};

use relay_channels::{chunk_for, ChannelAdapter, MarkupDialect};
use relay_core::{
    ChannelKind, DeliveryAttempt, ExchangeId, ExchangeStage, FormattedAnswer, Inbound, InboundMessage,
    RelayError, ResearchAnswer,
};
use relay_research::ResearchRequest;

use crate::app::AppState;
use crate::dispatch::{chunk_answer, deliver_reply, format_answer, FanoutEnvelope};

/// Per-request knobs for an exchange.
#[derive(Debug, Clone, Default)]
pub struct ExchangeOptions {
    /// Forwarded to the research backend in place of the configured key.
    pub auth_token: Option<String>,
    /// Markup dialect requested by the caller; defaults to the adapter's own.
    pub dialect: Option<MarkupDialect>,
}

#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    pub id: ExchangeId,
    pub message: InboundMessage,
    pub answer: ResearchAnswer,
    pub formatted: FormattedAnswer,
    pub replies: Vec<DeliveryAttempt>,
    pub fanout: Vec<DeliveryAttempt>,
}

/// Everything that came out of one channel payload.
#[derive(Debug, Clone, Default)]
pub struct InboundReport {
    pub exchanges: Vec<ExchangeOutcome>,
    /// Canned replies sent without asking the research backend.
    pub canned: Vec<DeliveryAttempt>,
    /// Query acknowledgements.
    pub acks: Vec<DeliveryAttempt>,
}

fn log_stage(id: &ExchangeId, message: &InboundMessage, stage: ExchangeStage) {
    debug!(exchange_id = %id, channel = %message.channel, stage = %stage, "exchange stage");
}

/// Stages logged by the HTTP handlers before a message exists.
pub fn log_ingress(channel: ChannelKind, stage: ExchangeStage) {
    if stage.is_terminal() {
        warn!(channel = %channel, stage = %stage, "request stage");
    } else {
        debug!(channel = %channel, stage = %stage, "request stage");
    }
}

/// Drive `message` through research, formatting, chunking and delivery.
///
/// Never fails: research errors become fallback text and delivery errors
/// are recorded per attempt.
pub async fn run_exchange(
    state: &AppState,
    adapter: &dyn ChannelAdapter,
    message: InboundMessage,
    opts: &ExchangeOptions,
) -> ExchangeOutcome {
    let id = ExchangeId::new();
    info!(
        exchange_id = %id,
        channel = %message.channel,
        sender = %message.sender_id,
        chars = message.text.chars().count(),
        "exchange started"
    );
    log_stage(&id, &message, ExchangeStage::Parsed);

    adapter.signal_typing(&message.channel_id).await;

    let mut request = ResearchRequest::from_message(&message);
    if let Some(token) = &opts.auth_token {
        request = request.with_auth_token(token.clone());
    }
    log_stage(&id, &message, ExchangeStage::Forwarded);
    let answer = state.research.fetch_answer(&request).await;
    if answer.succeeded {
        log_stage(&id, &message, ExchangeStage::Answered);
    } else {
        warn!(
            exchange_id = %id,
            backend = state.research.name(),
            error = answer.error_detail.as_deref().unwrap_or(""),
            "research failed, replying with fallback"
        );
        log_stage(&id, &message, ExchangeStage::ForwardFailed);
        log_stage(&id, &message, ExchangeStage::Fallback);
    }

    let formatted = format_answer(adapter, &answer, opts.dialect);
    log_stage(&id, &message, ExchangeStage::Formatted);
    let chunks = chunk_answer(adapter, &formatted);
    log_stage(&id, &message, ExchangeStage::Chunked);

    let envelope = FanoutEnvelope::new(&message, &answer.text);
    let (replies, fanout) = tokio::join!(
        deliver_reply(adapter, &message.channel_id, &chunks),
        state.dispatcher.fan_out(&envelope),
    );

    info!(
        exchange_id = %id,
        stage = %ExchangeStage::Delivered,
        answered = answer.succeeded,
        chunks = chunks.len(),
        replies_failed = replies.iter().filter(|a| !a.succeeded).count(),
        fanout_failed = fanout.iter().filter(|a| !a.succeeded).count(),
        "exchange finished"
    );

    ExchangeOutcome {
        id,
        message,
        answer,
        formatted,
        replies,
        fanout,
    }
}

/// Handle every item parsed from one payload, in order.
pub async fn process_inbound(
    state: &AppState,
    adapter: &dyn ChannelAdapter,
    items: Vec<Inbound>,
    opts: &ExchangeOptions,
) -> InboundReport {
    let mut report = InboundReport::default();
    for item in items {
        match item {
            Inbound::Message(message) => {
                let outcome = run_exchange(state, adapter, message, opts).await;
                report.exchanges.push(outcome);
            }
            Inbound::Reply(reply) => {
                debug!(channel = %reply.channel, channel_id = %reply.channel_id, "sending canned reply");
                let chunks = chunk_for(&reply.text, adapter.max_message_length());
                let attempts = deliver_reply(adapter, &reply.channel_id, &chunks).await;
                report.canned.extend(attempts);
            }
            Inbound::Query(query) => {
                if let Some(attempt) = adapter.answer_query(&query).await {
                    report.acks.push(attempt);
                }
            }
        }
    }
    report
}

/// Run [`process_inbound`] on its own task and wait for it.
pub async fn spawn_inbound(
    state: Arc<AppState>,
    adapter: Arc<dyn ChannelAdapter>,
    items: Vec<Inbound>,
    opts: ExchangeOptions,
) -> Result<InboundReport, RelayError> {
    tokio::spawn(async move { process_inbound(&state, adapter.as_ref(), items, &opts).await })
        .await
        .map_err(|e| RelayError::Internal(format!("exchange task aborted: {e}")))
}

/// Run a single exchange on its own task and wait for it.
pub async fn spawn_exchange(
    state: Arc<AppState>,
    adapter: Arc<dyn ChannelAdapter>,
    message: InboundMessage,
    opts: ExchangeOptions,
) -> Result<ExchangeOutcome, RelayError> {
    tokio::spawn(async move { run_exchange(&state, adapter.as_ref(), message, &opts).await })
        .await
        .map_err(|e| RelayError::Internal(format!("exchange task aborted: {e}")))
}
