//! WASM-compatible wrapper types for image data.
//!
//! This module provides JavaScript-friendly types that wrap the core passport
//! types, handling the conversion between Rust and JavaScript data representations.

use passport_core::decode::{DecodedImage, FilterType, PixelLayout};
use wasm_bindgen::prelude::*;

/// A decoded image wrapper for JavaScript.
///
/// Pixels are RGB (3 bytes per pixel) or, for background-removed
/// foregrounds, straight-alpha RGBA (4 bytes per pixel). Check `has_alpha`
/// before interpreting the buffer.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`.
///
/// The `free()` method can be called to explicitly release WASM memory, but this is
/// optional as wasm-bindgen's finalizer will handle cleanup automatically.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    has_alpha: bool,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Create an RGB image from dimensions and pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            has_alpha: false,
            pixels,
        }
    }

    /// Create an RGBA image, e.g. from `ImageData.data` of a canvas.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            has_alpha: true,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether `pixels` is RGBA rather than RGB.
    #[wasm_bindgen(getter)]
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns the pixel data as a Uint8Array copy.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    ///
    /// This is optional - wasm-bindgen's finalizer will handle cleanup automatically.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            has_alpha: img.has_alpha(),
            pixels: img.pixels,
        }
    }

    /// Convert back to a core DecodedImage, checking the buffer length.
    ///
    /// Note: This clones the pixel data.
    pub(crate) fn to_decoded(&self) -> Result<DecodedImage, JsValue> {
        self.try_to_decoded().map_err(|e| JsValue::from_str(&e))
    }

    fn layout(&self) -> PixelLayout {
        if self.has_alpha {
            PixelLayout::Rgba8
        } else {
            PixelLayout::Rgb8
        }
    }

    pub(crate) fn try_to_decoded(&self) -> Result<DecodedImage, String> {
        DecodedImage::from_raw(self.width, self.height, self.layout(), self.pixels.clone())
            .map_err(|e| e.to_string())
    }
}

/// Convert a u8 filter type value to the core FilterType enum.
///
/// Values:
/// - 0 = Nearest (fastest, lowest quality)
/// - 1 = Bilinear (good balance of speed and quality)
/// - 2 = Lanczos3 (best quality, slowest)
///
/// Any other value defaults to Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}

/// Map any displayable error to a JavaScript string value.
pub(crate) fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_decoded_image_creation() {
        let img = JsDecodedImage::new(100, 50, vec![0u8; 100 * 50 * 3]);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
        assert!(!img.has_alpha());
        assert_eq!(img.byte_length(), 15000);
    }

    #[test]
    fn test_from_decoded_keeps_alpha() {
        let decoded =
            DecodedImage::from_raw(2, 2, PixelLayout::Rgba8, vec![9u8; 16]).unwrap();
        let js_img = JsDecodedImage::from_decoded(decoded);
        assert!(js_img.has_alpha());
        assert_eq!(js_img.byte_length(), 16);
    }

    #[test]
    fn test_round_trip_rgba() {
        let js_img = JsDecodedImage::from_rgba(3, 1, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        let decoded = js_img.try_to_decoded().unwrap();
        assert_eq!(decoded.layout, PixelLayout::Rgba8);
        assert_eq!(decoded.pixel_rgba(2, 0), Some([9, 10, 11, 12]));
    }

    #[test]
    fn test_mismatched_buffer_rejected() {
        let js_img = JsDecodedImage::new(10, 10, vec![0u8; 12]);
        assert!(js_img.try_to_decoded().is_err());
    }

    #[test]
    fn test_filter_from_u8() {
        assert!(matches!(filter_from_u8(0), FilterType::Nearest));
        assert!(matches!(filter_from_u8(1), FilterType::Bilinear));
        assert!(matches!(filter_from_u8(2), FilterType::Lanczos3));
        // Unknown values default to Bilinear
        assert!(matches!(filter_from_u8(3), FilterType::Bilinear));
        assert!(matches!(filter_from_u8(255), FilterType::Bilinear));
    }
}
