//! Lossless PNG encoding.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::io::Cursor;

use super::{check_buffer, EncodeError};
use crate::decode::{DecodedImage, PixelLayout};

/// Encode an RGB or RGBA image to PNG bytes, keeping any alpha channel.
pub fn encode_png(image: &DecodedImage) -> Result<Vec<u8>, EncodeError> {
    check_buffer(image)?;

    let color = match image.layout {
        PixelLayout::Rgb8 => ExtendedColorType::Rgb8,
        PixelLayout::Rgba8 => ExtendedColorType::Rgba8,
    };
    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(&image.pixels, image.width, image.height, color)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
