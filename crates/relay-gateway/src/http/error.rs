//! Error bodies for the HTTP surface: `{status: "error", error, timestamp}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use relay_channels::ChannelError;
use relay_core::{ChannelKind, ExchangeStage, RelayError};

use crate::exchange::log_ingress;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Authentication or signature failure; ends the exchange as `rejected`.
    pub fn rejected(channel: ChannelKind, e: RelayError) -> Self {
        log_ingress(channel, ExchangeStage::Rejected);
        e.into()
    }

    pub fn not_configured(channel: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{channel} channel is not configured"),
        )
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::Authentication => Self::new(StatusCode::UNAUTHORIZED, e.to_string()),
            RelayError::Signature { .. } => {
                Self::new(StatusCode::UNAUTHORIZED, "Invalid webhook signature")
            }
            RelayError::Serialization(_) => {
                Self::new(StatusCode::BAD_REQUEST, "Invalid JSON format")
            }
            RelayError::MalformedPayload(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            other => {
                error!(code = other.code(), error = %other, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<ChannelError> for ApiError {
    fn from(e: ChannelError) -> Self {
        RelayError::from(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": "error",
            "error": self.message,
            "timestamp": Utc::now().timestamp(),
        });
        (self.status, Json(body)).into_response()
    }
}
