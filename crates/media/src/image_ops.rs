//! Image normalization for chat attachments.
//!
//! Every image that enters a conversation is bounded to a maximum dimension,
//! encoded as PNG and base64, and tagged with a coarse detail level the chat
//! backend uses to pick its image-processing cost.

use std::io::Cursor;

use {
    base64::Engine,
    image::{DynamicImage, GenericImageView, ImageFormat, ImageReader, imageops::FilterType},
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{Error, Result};

/// Maximum width or height of a normalized image.
pub const MAX_DIMENSION: u32 = 1024;

/// Images whose largest side is below this are sent with `low` detail.
pub const DETAIL_THRESHOLD: u32 = 512;

/// MIME type of every normalized attachment.
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Coarse image-size hint for the chat backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Low,
    High,
}

impl DetailLevel {
    /// `Low` iff the largest side is strictly below `threshold`.
    #[must_use]
    pub fn for_dimensions(width: u32, height: u32, threshold: u32) -> Self {
        if width.max(height) < threshold {
            Self::Low
        } else {
            Self::High
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size limits applied during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_dimension: u32,
    pub detail_threshold: u32,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            detail_threshold: DETAIL_THRESHOLD,
        }
    }
}

/// Canonical image payload embedded in a user exchange.
///
/// Always PNG. Dimensions are not kept; they only decide `detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Base64-encoded PNG bytes.
    pub data: String,
    pub detail: DetailLevel,
}

impl Attachment {
    #[must_use]
    pub fn media_type(&self) -> &'static str {
        PNG_MEDIA_TYPE
    }

    /// `data:` URL form accepted by vision-capable chat APIs.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{PNG_MEDIA_TYPE};base64,{}", self.data)
    }
}

/// Result of [`normalize_image`].
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub attachment: Attachment,
    /// Format detected from the input bytes.
    pub source_format: Option<ImageFormat>,
    pub original_width: u32,
    pub original_height: u32,
    /// Dimensions after resizing.
    pub width: u32,
    pub height: u32,
    pub was_resized: bool,
    /// Whether PNG bytes were produced from the decoded image rather than
    /// passed through from the input.
    pub was_reencoded: bool,
}

impl NormalizedImage {
    /// Human-readable one-liner, e.g. `image: 1024x768, detail: high`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "image: {}x{}, detail: {}",
            self.width, self.height, self.attachment.detail
        )
    }

    #[must_use]
    pub fn into_parts(self) -> (Attachment, String) {
        let summary = self.summary();
        (self.attachment, summary)
    }
}

/// Normalize raw image bytes into a PNG attachment.
///
/// 1. Decodes the image and detects its format.
/// 2. Shrinks it with a Lanczos filter when either side exceeds
///    `limits.max_dimension`, keeping the aspect ratio.
/// 3. Re-encodes to PNG unless the input was a PNG that needed no resize, in
///    which case the original bytes are kept.
/// 4. Derives the detail level from the final dimensions.
pub fn normalize_image(data: &[u8], limits: ImageLimits) -> Result<NormalizedImage> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::decode("failed to guess image format", e))?;
    let source_format = reader.format();
    let img = reader
        .decode()
        .map_err(|e| Error::decode("failed to decode image", e))?;

    let (original_width, original_height) = img.dimensions();
    let needs_resize =
        original_width > limits.max_dimension || original_height > limits.max_dimension;

    let img = if needs_resize {
        let (width, height) =
            fit_within(original_width, original_height, limits.max_dimension);
        to_true_color(img).resize_exact(width, height, FilterType::Lanczos3)
    } else {
        img
    };
    let (width, height) = img.dimensions();

    let keep_original = !needs_resize && source_format == Some(ImageFormat::Png);
    let png = if keep_original {
        data.to_vec()
    } else {
        encode_png(&img)?
    };

    let detail = DetailLevel::for_dimensions(width, height, limits.detail_threshold);
    debug!(
        original_dims = %format!("{original_width}x{original_height}"),
        final_dims = %format!("{width}x{height}"),
        format = ?source_format,
        resized = needs_resize,
        png_bytes = png.len(),
        %detail,
        "normalized image"
    );

    Ok(NormalizedImage {
        attachment: Attachment {
            data: base64::engine::general_purpose::STANDARD.encode(&png),
            detail,
        },
        source_format,
        original_width,
        original_height,
        width,
        height,
        was_resized: needs_resize,
        was_reencoded: !keep_original,
    })
}

/// Scale `(width, height)` so the larger side equals `max_dimension`.
///
/// The smaller side is truncated, never rounded up, and never drops below 1.
/// Dimensions already within bounds are returned unchanged.
#[must_use]
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let scale = |side: u32, longest: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(max_dimension) / u64::from(longest);
        u32::try_from(scaled).unwrap_or(max_dimension).max(1)
    };
    if width > height {
        (max_dimension, scale(height, width))
    } else {
        (scale(width, height), max_dimension)
    }
}

/// Expand the image into an 8-bit true-color buffer before resampling.
///
/// Palette images come out of the decoders already expanded; transparency
/// decides between RGBA and RGB.
fn to_true_color(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut output = Cursor::new(Vec::new());
    img.write_to(&mut output, ImageFormat::Png)
        .map_err(Error::encode)?;
    Ok(output.into_inner())
}
