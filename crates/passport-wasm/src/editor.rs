//! Crop editor WASM bindings.
//!
//! The editor owns the source image and tracks pan, zoom and the viewport
//! size. The UI forwards pointer and slider events and draws the RGBA
//! buffer returned by `render_preview` into its canvas.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const editor = new JsCropEditor(image);
//! editor.measure_viewport(canvas.width, canvas.height);
//! canvas.onpointerdown = (e) => editor.pointer_down(e.offsetX, e.offsetY);
//! canvas.onpointermove = (e) => {
//!   if (editor.pointer_move(e.offsetX, e.offsetY)) redraw();
//! };
//!
//! const cropped = editor.extract(2); // 413x531, Lanczos3
//! ```

use crate::types::{filter_from_u8, js_error, JsDecodedImage};
use passport_core::decode::DecodedImage;
use passport_core::geometry::{CropEditor, Point, Size};
use passport_core::raster::{self, extract_crop, Canvas};
use passport_core::PassportConfig;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct JsCropEditor {
    image: DecodedImage,
    editor: CropEditor,
    config: PassportConfig,
}

#[wasm_bindgen]
impl JsCropEditor {
    /// Start editing `image` with the default 3.5 x 4.5 cm frame.
    #[wasm_bindgen(constructor)]
    pub fn new(image: &JsDecodedImage) -> Result<JsCropEditor, JsValue> {
        Self::with_config(image.to_decoded()?, PassportConfig::default()).map_err(js_error)
    }

    /// Returns false (and keeps the previous state) for a degenerate size.
    pub fn measure_viewport(&mut self, width: f64, height: f64) -> bool {
        self.editor.measure_viewport(Size::new(width, height))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.editor.pointer_down(Point::new(x, y));
    }

    /// Returns true if the image moved and the preview needs a redraw.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.editor.pointer_move(Point::new(x, y))
    }

    /// Also call on pointer leave.
    pub fn pointer_up(&mut self) {
        self.editor.pointer_up();
    }

    /// Returns the zoom actually applied after snapping and clamping.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.editor.set_zoom(zoom)
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.editor.transform().zoom
    }

    #[wasm_bindgen(getter)]
    pub fn is_ready(&self) -> bool {
        self.editor.is_ready()
    }

    /// The crop area in source pixels as `{x, y, width, height}`, or
    /// `undefined` before the viewport is measured.
    pub fn crop_area(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.editor.crop_area()).map_err(js_error)
    }

    /// RGBA preview at the viewport size, or `undefined` before measurement.
    pub fn render_preview(&self) -> Result<Option<JsDecodedImage>, JsValue> {
        self.try_render_preview().map_err(js_error)
    }

    /// Extract the crop at the passport output size.
    ///
    /// # Arguments
    /// * `filter` - 0=Nearest, 1=Bilinear, 2=Lanczos3
    pub fn extract(&self, filter: u8) -> Result<JsDecodedImage, JsValue> {
        self.try_extract(filter).map_err(js_error)
    }
}

impl JsCropEditor {
    fn with_config(image: DecodedImage, config: PassportConfig) -> Result<Self, String> {
        if image.is_empty() {
            return Err("Image has no pixels".to_string());
        }
        let editor = CropEditor::new(
            Size::from(image.dimensions()),
            config.aspect_ratio(),
            config.zoom,
        );
        Ok(Self {
            image,
            editor,
            config,
        })
    }

    fn try_render_preview(&self) -> Result<Option<JsDecodedImage>, String> {
        let Some(viewport) = self.editor.viewport() else {
            return Ok(None);
        };
        let mut canvas = Canvas::new(
            viewport.width.round() as u32,
            viewport.height.round() as u32,
        )
        .map_err(|e| e.to_string())?;
        let drawn = raster::render_preview(&mut canvas, &self.image, &self.editor, &self.config.preview)
            .map_err(|e| e.to_string())?;
        Ok(drawn.then(|| JsDecodedImage::from_decoded(canvas.into_image())))
    }

    fn try_extract(&self, filter: u8) -> Result<JsDecodedImage, String> {
        let area = self
            .editor
            .crop_area()
            .ok_or_else(|| "Crop area is not available yet".to_string())?;
        extract_crop(
            &self.image,
            area,
            self.config.output_size(),
            filter_from_u8(filter),
        )
        .map(JsDecodedImage::from_decoded)
        .map_err(|e| e.to_string())
    }
}
