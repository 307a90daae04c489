use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The backing store could not be reached.
    #[error("session store unavailable: {message}")]
    Unavailable { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
