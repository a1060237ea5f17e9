//! WhatsApp Cloud API webhook: subscription handshake and message delivery.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use relay_core::{ChannelKind, ExchangeStage, RelayError};

use crate::app::AppState;
use crate::exchange::{log_ingress, spawn_inbound, ExchangeOptions};
use crate::http::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// GET /webhooks/whatsapp
///
/// Echoes `hub.challenge` when the mode is `subscribe` and the token matches;
/// anything else is a 403 with an empty body.
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let Some(cfg) = &state.config.channels.whatsapp else {
        return ApiError::not_configured("whatsapp").into_response();
    };

    let token_matches = !cfg.verify_token.is_empty()
        && params.verify_token.as_deref() == Some(cfg.verify_token.as_str());

    if params.mode.as_deref() == Some("subscribe") && token_matches {
        info!("whatsapp: webhook subscription verified");
        return (StatusCode::OK, params.challenge.unwrap_or_default()).into_response();
    }

    warn!(mode = ?params.mode, "whatsapp: webhook verification rejected");
    StatusCode::FORBIDDEN.into_response()
}

/// POST /webhooks/whatsapp
///
/// The signature is checked over the raw body before anything is parsed.
/// Payload entries the adapter cannot read are logged and acknowledged.
pub async fn receive_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let adapter = state
        .adapters
        .get(ChannelKind::Whatsapp)
        .ok_or_else(|| ApiError::not_configured("whatsapp"))?;
    log_ingress(ChannelKind::Whatsapp, ExchangeStage::Received);

    if !state
        .verifier
        .verify(ChannelKind::Whatsapp, &body, &headers, None)
    {
        return Err(ApiError::rejected(
            ChannelKind::Whatsapp,
            RelayError::Signature {
                channel: "whatsapp".into(),
                reason: "X-Hub-Signature-256 did not verify".into(),
            },
        ));
    }
    log_ingress(ChannelKind::Whatsapp, ExchangeStage::Authenticated);

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "whatsapp: invalid JSON body");
        RelayError::from(e)
    })?;

    let items = adapter.parse_inbound(&payload).unwrap_or_else(|e| {
        warn!(error = %e, "whatsapp: payload not understood, acknowledging anyway");
        Vec::new()
    });
    info!(items = items.len(), bytes = body.len(), "whatsapp: webhook accepted");

    let report = spawn_inbound(state.clone(), adapter, items, ExchangeOptions::default()).await?;
    info!(exchanges = report.exchanges.len(), "whatsapp: webhook processed");

    Ok(Json(json!({"status": "success"})))
}
