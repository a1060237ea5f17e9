use thiserror::Error;

/// Errors that can occur within any channel adapter.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The inbound payload does not have the shape this channel expects.
    #[error("{0}")]
    MalformedPayload(String),

    /// A message could not be delivered to the remote endpoint.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The channel-specific configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<ChannelError> for relay_core::RelayError {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::MalformedPayload(msg) => relay_core::RelayError::MalformedPayload(msg),
            ChannelError::SendFailed(reason) => relay_core::RelayError::Delivery {
                target: "channel".to_string(),
                reason,
            },
            ChannelError::ConfigError(msg) => relay_core::RelayError::Config(msg),
        }
    }
}
