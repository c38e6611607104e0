//! Raster surfaces and crop rasterization.
//!
//! Drawing goes through the [`RasterSurface`] trait so the preview and
//! extraction logic can run against an in-memory [`Canvas`] in tests and
//! against any other backend a host provides.
//!
//! # Drawing Model
//!
//! - Coordinates are surface pixels, origin top-left, `f64` precision
//! - `draw_image` maps a source rectangle of an image onto a destination
//!   rectangle, scaling as needed, and blends source-over
//! - `fill_rect` blends a solid color source-over

mod canvas;
mod extract;
mod preview;

use thiserror::Error;

use crate::decode::DecodedImage;
use crate::geometry::Rect;

pub use canvas::{Canvas, MAX_CANVAS_DIMENSION};
pub use extract::{extract_crop, extract_crop_into};
pub use preview::{render_preview, PreviewStyle};

/// Failures while allocating or drawing on a surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    /// The surface could not be allocated at the requested size.
    #[error("Cannot allocate a {width}x{height} surface")]
    Allocation { width: u32, height: u32 },

    /// The source image has no pixels or a malformed buffer.
    #[error("Source image is empty or malformed")]
    InvalidSource,

    /// The requested source region does not intersect the image.
    #[error("Source region lies outside the image")]
    EmptySourceRegion,
}

/// A drawable 2D surface.
pub trait RasterSurface {
    /// Surface size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Blend a solid RGBA color over `rect`.
    fn fill_rect(&mut self, rect: Rect, color: image::Rgba<u8>);

    /// Draw the `src` region of `image` scaled into `dst`.
    ///
    /// Portions of `src` outside the image and portions of `dst` outside
    /// the surface are dropped, keeping the mapping between the two.
    fn draw_image(&mut self, image: &DecodedImage, src: Rect, dst: Rect)
        -> Result<(), CanvasError>;
}
