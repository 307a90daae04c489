//! Media pipeline: turn inbound images into bounded, PNG-encoded attachments
//! ready to embed in a chat exchange.

pub mod error;
pub mod image_ops;

pub use {
    error::{Error, Result},
    image_ops::{Attachment, DetailLevel, ImageLimits, NormalizedImage, normalize_image},
};
