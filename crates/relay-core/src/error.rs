use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid or missing API key")]
    Authentication,

    #[error("Invalid {channel} signature: {reason}")]
    Signature { channel: String, reason: String },

    #[error("{0}")]
    MalformedPayload(String),

    #[error("Research service error: {0}")]
    Upstream(String),

    #[error("Delivery error ({target}): {reason}")]
    Delivery { target: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Short error code string for logs and error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::Authentication => "AUTH_FAILED",
            RelayError::Signature { .. } => "SIGNATURE_INVALID",
            RelayError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            RelayError::Upstream(_) => "UPSTREAM_ERROR",
            RelayError::Delivery { .. } => "DELIVERY_ERROR",
            RelayError::Serialization(_) => "SERIALIZATION_ERROR",
            RelayError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
