//! Export encoding and the save-as side effect.
//!
//! - [`encode_jpeg`] / [`encode_png`] serialize a raster as-is
//! - [`encode_for_export`] flattens onto a fresh output-sized canvas first,
//!   so every exported file has exactly the output dimensions
//! - [`SaveTarget`] receives the finished file
//!
//! # Examples
//!
//! ```ignore
//! use passport_core::encode::{export_image, ExportFormat, ExportOptions};
//!
//! let file = export_image(&final_image, ExportFormat::Png, &ExportOptions::default())?;
//! assert_eq!(file.filename, "passport-photo-3.5x4.5cm.png");
//! ```

mod export;
mod jpeg;
mod png;

use std::path::PathBuf;

use thiserror::Error;

use crate::decode::{DecodedImage, PixelLayout};
use crate::raster::CanvasError;

pub use export::{
    encode_for_export, export_filename, export_image, DirectoryTarget, ExportFormat,
    ExportOptions, ExportedFile, SaveTarget,
};
pub use jpeg::{encode_jpeg, DEFAULT_JPEG_QUALITY};
pub use png::encode_png;

/// Errors that can occur while encoding or saving an export.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match the image dimensions.
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The format cannot carry this channel layout.
    #[error("{format} cannot encode {layout:?} pixels")]
    UnsupportedLayout {
        format: &'static str,
        layout: PixelLayout,
    },

    /// The codec failed.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// Flattening onto the output canvas failed.
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// Writing the file failed.
    #[error("Failed to save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn check_buffer(image: &DecodedImage) -> Result<(), EncodeError> {
    if image.width == 0 || image.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }
    let expected = image.width as usize * image.height as usize * image.layout.channels();
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }
    Ok(())
}
