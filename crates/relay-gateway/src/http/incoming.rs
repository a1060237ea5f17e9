//! Generic webhook ingress: POST /webhooks/incoming.
//!
//! Callers authenticate with an API key (`X-API-Key` or a bearer token) and
//! may sign the body with `X-Webhook-Signature`. The answer is returned in
//! the HTTP response rather than sent anywhere.

use std::sync::Arc;
use std::time::Instant;

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use relay_channels::{
    credentials::{candidate_key, redact},
    MarkupDialect, WebhookEnvelope,
};
use relay_core::{ChannelKind, ExchangeStage, RelayError};

use crate::app::AppState;
use crate::exchange::{log_ingress, spawn_exchange, ExchangeOptions};
use crate::http::error::ApiError;

pub async fn incoming_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let started = Instant::now();
    log_ingress(ChannelKind::Webhook, ExchangeStage::Received);

    let Some(credential) = state.credentials.lookup(candidate_key(&headers)) else {
        warn!("webhook: rejected request with invalid or missing API key");
        return Err(ApiError::rejected(ChannelKind::Webhook, RelayError::Authentication));
    };

    if !state
        .verifier
        .verify(ChannelKind::Webhook, &body, &headers, Some(&credential))
    {
        return Err(ApiError::rejected(
            ChannelKind::Webhook,
            RelayError::Signature {
                channel: "webhook".into(),
                reason: "X-Webhook-Signature did not verify".into(),
            },
        ));
    }
    log_ingress(ChannelKind::Webhook, ExchangeStage::Authenticated);

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "webhook: invalid JSON body");
        RelayError::from(e)
    })?;
    let envelope = WebhookEnvelope::parse(&payload)?;

    info!(
        api_key = %redact(&credential.key),
        scope = %credential.scope,
        webhook_type = %envelope.webhook_type,
        source_system = %envelope.source_system,
        "webhook usage"
    );

    let response = match envelope.webhook_type.as_str() {
        "message" => {
            let adapter = state
                .adapters
                .get_or_default(ChannelKind::Webhook)
                .ok_or_else(|| RelayError::Internal("webhook adapter not registered".into()))?;
            let opts = ExchangeOptions {
                auth_token: Some(credential.key.clone()),
                dialect: envelope.platform.as_deref().map(MarkupDialect::from_platform),
            };
            let outcome =
                spawn_exchange(state.clone(), adapter, envelope.to_inbound(), opts).await?;
            json!({
                "research_response": outcome.formatted.text,
                "message_processed": true,
            })
        }
        "event" => event_ack(&envelope.event_type),
        _ => json!({
            "webhook_received": true,
            "data_keys": envelope.data_keys(),
            "source_system": envelope.source_system,
        }),
    };

    Ok(Json(json!({
        "status": "success",
        "webhook_type": envelope.webhook_type,
        "response": response,
        "user_id": envelope.user_id,
        "source_system": envelope.source_system,
        "processing_time": round_secs(started.elapsed().as_secs_f64()),
        "timestamp": Utc::now().timestamp(),
    })))
}

/// Seconds rounded to two decimals.
fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

fn event_ack(event_type: &str) -> Value {
    match event_type {
        "user_action" => json!({"event_processed": true, "action_logged": true}),
        "system_alert" => json!({"alert_received": true, "status": "acknowledged"}),
        other => json!({"event_type": other, "status": "received"}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_events_get_specific_acks() {
        assert_eq!(event_ack("user_action")["action_logged"], true);
        assert_eq!(event_ack("system_alert")["status"], "acknowledged");
    }

    #[test]
    fn processing_time_keeps_two_decimals() {
        assert_eq!(round_secs(1.23456), 1.23);
        assert_eq!(round_secs(0.005), 0.01);
        assert_eq!(round_secs(0.0), 0.0);
    }

    #[test]
    fn unknown_events_echo_their_type() {
        assert_eq!(
            event_ack("deploy"),
            json!({"event_type": "deploy", "status": "received"})
        );
        assert_eq!(event_ack("")["status"], "received");
    }
}
