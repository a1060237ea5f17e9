use thiserror::Error;

/// Why a research call produced no answer. Never leaves the crate's
/// [`ResearchBackend`](crate::ResearchBackend) boundary as an `Err`.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("research backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("research backend reported status {0:?}")]
    Unsuccessful(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ResearchError {
    /// The backend answered but refused or failed the request, as opposed
    /// to the call itself breaking (timeout, connection, garbage body).
    pub fn is_backend_refusal(&self) -> bool {
        matches!(self, ResearchError::Api { .. } | ResearchError::Unsuccessful(_))
    }
}

impl From<ResearchError> for relay_core::RelayError {
    fn from(e: ResearchError) -> Self {
        relay_core::RelayError::Upstream(e.to_string())
    }
}
