//! Telegram Bot API webhook.
//!
//! Telegram does not sign its webhook calls; the route is only as private as
//! its URL.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};
use tracing::{info, warn};

use relay_core::{ChannelKind, ExchangeStage, RelayError};

use crate::app::AppState;
use crate::exchange::{log_ingress, spawn_inbound, ExchangeOptions};
use crate::http::error::ApiError;

/// POST /webhooks/telegram
pub async fn receive_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let adapter = state
        .adapters
        .get(ChannelKind::Telegram)
        .ok_or_else(|| ApiError::not_configured("telegram"))?;
    // Unsigned, so received and authenticated are the same step.
    log_ingress(ChannelKind::Telegram, ExchangeStage::Received);
    log_ingress(ChannelKind::Telegram, ExchangeStage::Authenticated);

    let update: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "telegram: invalid JSON body");
        RelayError::from(e)
    })?;

    let items = adapter.parse_inbound(&update).unwrap_or_else(|e| {
        warn!(error = %e, "telegram: update not understood, acknowledging anyway");
        Vec::new()
    });

    let report = spawn_inbound(state.clone(), adapter, items, ExchangeOptions::default()).await?;
    info!(
        exchanges = report.exchanges.len(),
        canned = report.canned.len(),
        acks = report.acks.len(),
        "telegram: update processed"
    );

    Ok(Json(json!({"status": "success"})))
}
