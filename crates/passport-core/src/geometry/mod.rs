//! Crop geometry: viewport space ↔ source-image pixel space.
//!
//! # Coordinate Systems
//!
//! - **Viewport space**: the interactive editor surface, origin top-left,
//!   units are surface pixels. The crop frame lives here.
//! - **Image space**: pixels of the decoded source image, origin top-left.
//!   The crop area lives here.
//!
//! The image is drawn centered in the viewport, shifted by the user's pan
//! offset and scaled by `base_scale * zoom` (the effective scale).

mod editor;
mod mapping;

use serde::{Deserialize, Serialize};

pub use editor::CropEditor;
pub use mapping::{
    clamp_crop_area, compute_base_scale, compute_crop_frame, image_rect_in_viewport,
    image_to_viewport_rect, viewport_to_image_rect, BASE_FIT_RATIO, FRAME_FILL_RATIO,
};

/// Width and height in floating-point units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// A position in viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in viewport space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Overlap of two rectangles, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        let r = Rect::new(x0, y0, x1 - x0, y1 - y0);
        (!r.is_empty()).then_some(r)
    }
}

/// A crop rectangle in source-image pixel coordinates.
///
/// After [`clamp_crop_area`] it satisfies `0 <= x`, `0 <= y`,
/// `x + width <= image width` and `y + height <= image height`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropArea {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The same rectangle, typed as a generic [`Rect`].
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Whether the area lies within an image of the given size.
    pub fn fits_within(&self, image: Size) -> bool {
        const EPS: f64 = 1e-9;
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= image.width + EPS
            && self.y + self.height <= image.height + EPS
    }
}

/// Exact pixel dimensions of an output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    /// 3.5 × 4.5 cm at 300 DPI.
    pub const PASSPORT: OutputSize = OutputSize {
        width: 413,
        height: 531,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

impl Default for OutputSize {
    fn default() -> Self {
        OutputSize::PASSPORT
    }
}

/// User-controlled pan and zoom applied to an image centered in a viewport.
///
/// `zoom` is the user-facing multiplier; pixel math always uses the
/// effective scale `base_scale * zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Transform {
    pub fn new(zoom: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            zoom,
            offset_x,
            offset_y,
        }
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

/// Bounds and granularity of the zoom slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 3.0,
            step: 0.1,
        }
    }
}

impl ZoomRange {
    /// Snap to the nearest step, then clamp into `[min, max]`.
    pub fn apply(&self, zoom: f64) -> f64 {
        let snapped = if self.step > 0.0 {
            let steps = ((zoom - self.min) / self.step).round();
            // Round away float noise such as 1.2000000000000002.
            ((self.min + steps * self.step) * 1e6).round() / 1e6
        } else {
            zoom
        };
        if snapped.is_nan() {
            return self.min;
        }
        snapped.max(self.min).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_validity() {
        assert!(Size::new(10.0, 5.0).is_valid());
        assert!(!Size::new(0.0, 5.0).is_valid());
        assert!(!Size::new(10.0, -1.0).is_valid());
        assert!(!Size::new(f64::NAN, 5.0).is_valid());
        assert!(!Size::new(f64::INFINITY, 5.0).is_valid());
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 0.0, 5.0, 5.0)));

        let far = Rect::new(20.0, 20.0, 1.0, 1.0);
        assert_eq!(a.intersect(&far), None);
    }

    #[test]
    fn test_zoom_range_clamps() {
        let range = ZoomRange::default();
        assert_eq!(range.apply(0.1), 0.5);
        assert_eq!(range.apply(9.0), 3.0);
        assert_eq!(range.apply(0.5), 0.5);
        assert_eq!(range.apply(3.0), 3.0);
    }

    #[test]
    fn test_zoom_range_snaps_to_step() {
        let range = ZoomRange::default();
        assert_eq!(range.apply(1.23), 1.2);
        assert_eq!(range.apply(1.26), 1.3);
        assert_eq!(range.apply(f64::NAN), 0.5);
    }

    #[test]
    fn test_passport_output_size() {
        assert_eq!(OutputSize::default(), OutputSize::new(413, 531));
    }

    #[test]
    fn test_crop_area_fits_within() {
        let image = Size::new(100.0, 100.0);
        assert!(CropArea::new(0.0, 0.0, 100.0, 100.0).fits_within(image));
        assert!(!CropArea::new(-1.0, 0.0, 10.0, 10.0).fits_within(image));
        assert!(!CropArea::new(95.0, 0.0, 10.0, 10.0).fits_within(image));
    }
}
