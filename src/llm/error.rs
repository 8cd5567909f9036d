use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl LlmError {
    /// Whether retrying the same request may succeed: network trouble,
    /// rate limiting, or a server-side failure.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Transport(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            LlmError::Decode(_) => false,
        }
    }
}
