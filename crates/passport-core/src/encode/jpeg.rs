//! JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::io::Cursor;

use super::{check_buffer, EncodeError};
use crate::decode::{DecodedImage, PixelLayout};

/// Default export quality (0.95 on a 0..1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Encode an image to JPEG bytes.
///
/// JPEG has no alpha channel: RGBA input must be flattened first, see
/// [`crate::composite::flatten`].
///
/// # Arguments
///
/// * `image` - RGB image to encode
/// * `quality` - JPEG quality, clamped to 1-100
///
/// # Errors
///
/// Returns `EncodeError::UnsupportedLayout` for RGBA input and
/// `EncodeError::InvalidPixelData` / `InvalidDimensions` for malformed
/// buffers.
pub fn encode_jpeg(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if image.layout != PixelLayout::Rgb8 {
        return Err(EncodeError::UnsupportedLayout {
            format: "JPEG",
            layout: image.layout,
        });
    }
    check_buffer(image)?;

    let quality = quality.clamp(1, 100);
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
