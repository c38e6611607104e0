//! Image decoding and upload intake.
//!
//! This module provides functionality for:
//! - Validating uploads (MIME type, then size)
//! - Decoding JPEG, PNG and WebP bytes with EXIF orientation applied
//! - Decoding base64 `data:` URLs
//!
//! All operations return new `DecodedImage` values; inputs are never
//! modified.

mod data_url;
mod load;
mod types;
mod upload;

pub use data_url::{decode_data_url, DataUrl, DEFAULT_DATA_URL_MIME};
pub use load::{decode_image, decode_image_no_orientation};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation, PixelLayout};
pub use upload::{
    UploadError, UploadPolicy, DEFAULT_ACCEPTED_MIME_TYPES, DEFAULT_MAX_UPLOAD_BYTES,
};
