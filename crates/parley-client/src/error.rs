use thiserror::Error;

/// Failure of a single request against the server.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    /// Statuses a retry cannot fix.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status))
    }
}
