//! Live preview of the crop editor: image, dimmed mask, grid and border.

use image::Rgba;
use serde::{Deserialize, Serialize};

use super::{CanvasError, RasterSurface};
use crate::decode::DecodedImage;
use crate::geometry::{CropEditor, Rect};

/// Colors and line widths of the preview overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewStyle {
    /// Dim applied outside the crop frame.
    pub mask: [u8; 4],
    pub border: [u8; 4],
    pub border_width: u32,
    /// Rule-of-thirds lines inside the frame.
    pub grid: [u8; 4],
    pub grid_width: u32,
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self {
            mask: [0, 0, 0, 128],
            border: [255, 255, 255, 255],
            border_width: 2,
            grid: [255, 255, 255, 77],
            grid_width: 1,
        }
    }
}

/// Render the editor's current state onto `surface`.
///
/// The surface is expected to be freshly allocated at the viewport size.
/// Returns `Ok(false)` without drawing while the editor has no valid
/// viewport measurement.
///
/// # Errors
///
/// Propagates drawing failures from the surface.
pub fn render_preview<S: RasterSurface>(
    surface: &mut S,
    image: &DecodedImage,
    editor: &CropEditor,
    style: &PreviewStyle,
) -> Result<bool, CanvasError> {
    let (Some(image_rect), Some(frame)) = (editor.image_rect(), editor.crop_frame()) else {
        return Ok(false);
    };

    let (width, height) = image.dimensions();
    let full_source = Rect::new(0.0, 0.0, width as f64, height as f64);
    match surface.draw_image(image, full_source, image_rect) {
        // Image panned entirely off the surface: still draw the overlay.
        Ok(()) | Err(CanvasError::EmptySourceRegion) => {}
        Err(e) => return Err(e),
    }

    let (vw, vh) = surface.dimensions();
    let (vw, vh) = (vw as f64, vh as f64);

    let mask = Rgba(style.mask);
    surface.fill_rect(Rect::new(0.0, 0.0, vw, frame.y), mask);
    surface.fill_rect(Rect::new(0.0, frame.bottom(), vw, vh - frame.bottom()), mask);
    surface.fill_rect(Rect::new(0.0, frame.y, frame.x, frame.height), mask);
    surface.fill_rect(
        Rect::new(frame.right(), frame.y, vw - frame.right(), frame.height),
        mask,
    );

    let grid = Rgba(style.grid);
    let gw = style.grid_width as f64;
    for i in 1..3 {
        let t = i as f64 / 3.0;
        let x = frame.x + frame.width * t;
        let y = frame.y + frame.height * t;
        surface.fill_rect(Rect::new(x - gw / 2.0, frame.y, gw, frame.height), grid);
        surface.fill_rect(Rect::new(frame.x, y - gw / 2.0, frame.width, gw), grid);
    }

    // Stroke centered on the frame edge.
    let border = Rgba(style.border);
    let bw = style.border_width as f64;
    let half = bw / 2.0;
    let outer = Rect::new(
        frame.x - half,
        frame.y - half,
        frame.width + bw,
        frame.height + bw,
    );
    surface.fill_rect(Rect::new(outer.x, outer.y, outer.width, bw), border);
    surface.fill_rect(
        Rect::new(outer.x, outer.bottom() - bw, outer.width, bw),
        border,
    );
    surface.fill_rect(
        Rect::new(outer.x, outer.y + bw, bw, outer.height - 2.0 * bw),
        border,
    );
    surface.fill_rect(
        Rect::new(outer.right() - bw, outer.y + bw, bw, outer.height - 2.0 * bw),
        border,
    );

    Ok(true)
}
