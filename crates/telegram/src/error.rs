use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bot API call failed after retries.
    #[error("telegram api request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Transport error while fetching a file body.
    #[error("file request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("file download failed: HTTP {status}")]
    Download { status: reqwest::StatusCode },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
