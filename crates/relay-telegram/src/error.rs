/// Errors produced by the Telegram adapter.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram api error {status}: {description}")]
    Api { status: u16, description: String },

    #[error("no bot token configured")]
    NoToken,
}

impl TelegramError {
    /// HTTP status returned by the Bot API, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            TelegramError::Api { status, .. } => Some(*status),
            TelegramError::Http(e) => e.status().map(|s| s.as_u16()),
            TelegramError::NoToken => None,
        }
    }

    /// A 400 whose description says the Markdown entities did not parse.
    pub fn is_rejected_markup(&self) -> bool {
        match self {
            TelegramError::Api {
                status: 400,
                description,
            } => description.contains("can't parse entities"),
            _ => false,
        }
    }
}
