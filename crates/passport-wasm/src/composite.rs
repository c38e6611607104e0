//! Background compositing WASM bindings.
//!
//! ```typescript
//! import { background_presets, composite_over_color } from '@passport/wasm';
//!
//! for (const preset of background_presets()) {
//!   const preview = composite_over_color(foreground, preset.color, 1);
//! }
//! ```

use crate::types::{filter_from_u8, js_error, JsDecodedImage};
use passport_core::color::{default_presets, Rgb};
use passport_core::composite;
use passport_core::geometry::OutputSize;
use wasm_bindgen::prelude::*;

/// Composite a background-removed foreground over a solid color.
///
/// # Arguments
/// * `foreground` - RGBA foreground, usually the background-removal result
/// * `color` - `#RRGGBB` or `#RGB`
/// * `filter` - 0=Nearest, 1=Bilinear, 2=Lanczos3
///
/// # Returns
///
/// An opaque 413x531 RGB image.
#[wasm_bindgen]
pub fn composite_over_color(
    foreground: &JsDecodedImage,
    color: &str,
    filter: u8,
) -> Result<JsDecodedImage, JsValue> {
    let foreground = foreground.to_decoded()?;
    let color = Rgb::from_hex(color).map_err(js_error)?;
    composite::composite_over_color(&foreground, color, OutputSize::PASSPORT, filter_from_u8(filter))
        .map(JsDecodedImage::from_decoded)
        .map_err(js_error)
}

/// The preset background colors as `[{name, color, description}]`.
#[wasm_bindgen]
pub fn background_presets() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&default_presets()).map_err(js_error)
}
