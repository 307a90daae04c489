use std::error::Error as StdError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bytes are not a decodable raster image.
    #[error("{context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("failed to encode image as PNG: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },
}

impl Error {
    #[must_use]
    pub fn decode<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Decode {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn encode(source: image::ImageError) -> Self {
        Self::Encode { source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
