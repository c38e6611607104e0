//! Upload validation and image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`validate_upload`] - Check a file's MIME type and size before reading it
//! - [`decode_image`] - Decode JPEG, PNG or WebP bytes with EXIF orientation applied
//! - [`decode_data_url`] - Decode a base64 `data:` URL
//!
//! # Example
//!
//! ```typescript
//! import { validate_upload, decode_image } from '@passport/wasm';
//!
//! validate_upload(file.type, file.size);
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes);
//! ```

use crate::types::{js_error, JsDecodedImage};
use passport_core::decode::{self, UploadPolicy};
use wasm_bindgen::prelude::*;

/// Validate an upload against the default policy (JPEG, PNG or WebP, at most 10 MB).
///
/// # Errors
///
/// Returns the user-facing rejection message.
#[wasm_bindgen]
pub fn validate_upload(mime: &str, size: f64) -> Result<(), JsValue> {
    check_upload(mime, size).map_err(|e| JsValue::from_str(&e))
}

fn check_upload(mime: &str, size: f64) -> Result<(), String> {
    let size = if size.is_finite() && size > 0.0 {
        size as u64
    } else {
        0
    };
    UploadPolicy::default()
        .validate(mime, size)
        .map_err(|e| e.to_string())
}

/// Decode image file bytes.
///
/// EXIF orientation is applied so the image is displayed upright.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported, intact image.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsDecodedImage, JsValue> {
    decode::decode_image(bytes)
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// Decode a `data:<mime>;base64,<payload>` URL, as produced by `FileReader`.
#[wasm_bindgen]
pub fn decode_data_url(url: &str) -> Result<JsDecodedImage, JsValue> {
    decode::decode_data_url(url)
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// Tests for decode bindings.
///
/// Functions returning `Result<T, JsValue>` only work on wasm32 targets;
/// the native tests cover the plain-Rust helpers.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_upload_accepts_jpeg() {
        assert!(check_upload("image/jpeg", 2_000_000.0).is_ok());
    }

    #[test]
    fn test_check_upload_rejects_gif() {
        assert!(check_upload("image/gif", 100.0).is_err());
    }

    #[test]
    fn test_check_upload_rejects_large_file() {
        assert!(check_upload("image/png", 11.0 * 1024.0 * 1024.0).is_err());
    }
}
