//! Passport WASM - WebAssembly bindings for the passport photo pipeline
//!
//! This crate exposes passport-core to the browser UI. Background removal
//! is not bound here: the web app calls the remote service itself and
//! passes the returned PNG through `decode_image`.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data
//! - `decode` - Upload validation and image decoding
//! - `editor` - Interactive crop editor and crop extraction
//! - `composite` - Solid-color background compositing
//! - `encode` - Export encoding (JPEG, PNG)
//!
//! # Usage
//!
//! ```typescript
//! import init, { decode_image, JsCropEditor } from '@passport/wasm';
//!
//! await init();
//!
//! const image = decode_image(new Uint8Array(await file.arrayBuffer()));
//! const editor = new JsCropEditor(image);
//! ```

use wasm_bindgen::prelude::*;

mod composite;
mod decode;
mod editor;
mod encode;
mod types;

pub use composite::{background_presets, composite_over_color};
pub use decode::{decode_data_url, decode_image, validate_upload};
pub use editor::JsCropEditor;
pub use encode::{encode_jpeg, encode_png, export_image, JsExportedFile};
pub use types::JsDecodedImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
