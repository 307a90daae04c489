use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Failure of a single inbound event.
///
/// None of these is fatal to the process: the router reports them to the
/// user as a generic notice and the session is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Attachment bytes are not a readable image.
    #[error("failed to decode image")]
    Decode {
        #[from]
        source: lingua_media::Error,
    },

    /// Binary payload could not be retrieved from the transport.
    #[error("failed to fetch file {file}")]
    Fetch {
        file: String,
        #[source]
        source: BoxError,
    },

    /// A downstream service failed or answered with nothing usable.
    #[error("{backend} backend failed: {message}")]
    Backend {
        backend: &'static str,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Internal invariant violated.
    #[error("invalid state: {message}")]
    State { message: String },

    #[error(transparent)]
    Session(#[from] lingua_sessions::Error),
}

impl Error {
    #[must_use]
    pub fn fetch(file: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Fetch {
            file: file.into(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn backend(backend: &'static str, source: anyhow::Error) -> Self {
        Self::Backend {
            backend,
            message: format!("{source:#}"),
            source: Some(source.into()),
        }
    }

    /// Backend answered successfully but the answer is unusable.
    #[must_use]
    pub fn empty_response(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Fetch { .. } => "fetch",
            Self::Backend { .. } => "backend",
            Self::State { .. } => "state",
            Self::Session(_) => "session",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
