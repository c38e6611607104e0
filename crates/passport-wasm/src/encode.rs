//! Export encoding WASM bindings.
//!
//! # Functions
//!
//! - [`export_image`] - Encode the final photo as a named download
//! - [`encode_jpeg`] - Encode an RGB image to JPEG bytes
//! - [`encode_png`] - Encode an image to PNG bytes
//!
//! # Example
//!
//! ```typescript
//! import { export_image } from '@passport/wasm';
//!
//! const file = export_image(finalImage, 'jpg');
//! const blob = new Blob([file.bytes()], { type: file.mime_type });
//! link.download = file.filename; // passport-photo-3.5x4.5cm.jpg
//! ```

use crate::types::{js_error, JsDecodedImage};
use passport_core::encode::{self, ExportFormat, ExportedFile};
use passport_core::PassportConfig;
use wasm_bindgen::prelude::*;

/// An encoded export ready to be offered as a download.
#[wasm_bindgen]
pub struct JsExportedFile {
    inner: ExportedFile,
}

#[wasm_bindgen]
impl JsExportedFile {
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.inner.filename.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type.to_string()
    }

    /// Encoded bytes as a Uint8Array copy.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }
}

/// Flatten the image to 413x531 and encode it for download.
///
/// # Arguments
/// * `format` - `"jpg"`, `"jpeg"` or `"png"`
#[wasm_bindgen]
pub fn export_image(image: &JsDecodedImage, format: &str) -> Result<JsExportedFile, JsValue> {
    let format: ExportFormat = format.parse().map_err(|e: String| JsValue::from_str(&e))?;
    let image = image.to_decoded()?;
    let options = PassportConfig::default().export_options();
    encode::export_image(&image, format, &options)
        .map(|inner| JsExportedFile { inner })
        .map_err(js_error)
}

/// Encode an RGB image to JPEG.
///
/// # Arguments
/// * `quality` - 1-100, values outside are clamped (recommended: 95)
#[wasm_bindgen]
pub fn encode_jpeg(image: &JsDecodedImage, quality: u8) -> Result<Vec<u8>, JsValue> {
    let image = image.to_decoded()?;
    encode::encode_jpeg(&image, quality).map_err(js_error)
}

/// Encode an RGB or RGBA image to PNG.
#[wasm_bindgen]
pub fn encode_png(image: &JsDecodedImage) -> Result<Vec<u8>, JsValue> {
    let image = image.to_decoded()?;
    encode::encode_png(&image).map_err(js_error)
}

/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn gray() -> JsDecodedImage {
        JsDecodedImage::new(413, 531, vec![128u8; 413 * 531 * 3])
    }

    #[wasm_bindgen_test]
    fn test_export_jpg_filename() {
        let file = export_image(&gray(), "jpg").unwrap();
        assert_eq!(file.filename(), "passport-photo-3.5x4.5cm.jpg");
        assert_eq!(file.mime_type(), "image/jpeg");
        assert_eq!(&file.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[wasm_bindgen_test]
    fn test_export_unknown_format() {
        assert!(export_image(&gray(), "gif").is_err());
    }

    #[wasm_bindgen_test]
    fn test_encode_png_signature() {
        let bytes = encode_png(&gray()).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
