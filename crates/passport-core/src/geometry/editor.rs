//! Interactive crop editor state: pan, zoom and the measured viewport.

use super::{
    compute_base_scale, compute_crop_frame, image_rect_in_viewport, viewport_to_image_rect,
    CropArea, Point, Rect, Size, Transform, ZoomRange,
};

/// Pan/zoom state for one loaded image.
///
/// The live offset is never clamped: the user may drag the image far past
/// the frame. Only the derived [`CropArea`] is clamped, at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct CropEditor {
    image: Size,
    aspect_ratio: f64,
    zoom_range: ZoomRange,
    viewport: Option<Size>,
    base_scale: Option<f64>,
    transform: Transform,
    /// Pointer position minus offset, recorded at pointer-down.
    drag_origin: Option<Point>,
}

impl CropEditor {
    pub fn new(image: Size, aspect_ratio: f64, zoom_range: ZoomRange) -> Self {
        Self {
            image,
            aspect_ratio,
            zoom_range,
            viewport: None,
            base_scale: None,
            transform: Transform::default(),
            drag_origin: None,
        }
    }

    /// Record a viewport measurement.
    ///
    /// A valid measurement recomputes the base scale and resets zoom and
    /// pan, giving the image fresh framing. An invalid (zero-area)
    /// measurement leaves the editor waiting and returns `false`.
    pub fn measure_viewport(&mut self, viewport: Size) -> bool {
        match compute_base_scale(self.image, viewport) {
            Some(scale) => {
                tracing::debug!(
                    viewport_width = viewport.width,
                    viewport_height = viewport.height,
                    base_scale = scale,
                    "viewport measured"
                );
                self.viewport = Some(viewport);
                self.base_scale = Some(scale);
                self.reset_transform();
                true
            }
            None => {
                tracing::debug!(?viewport, "ignoring unusable viewport measurement");
                false
            }
        }
    }

    pub fn reset_transform(&mut self) {
        self.transform = Transform::default();
        self.drag_origin = None;
    }

    pub fn pointer_down(&mut self, at: Point) {
        self.drag_origin = Some(Point::new(
            at.x - self.transform.offset_x,
            at.y - self.transform.offset_y,
        ));
    }

    /// Returns `true` if the offset changed (a drag is in progress).
    pub fn pointer_move(&mut self, at: Point) -> bool {
        let Some(origin) = self.drag_origin else {
            return false;
        };
        self.transform.offset_x = at.x - origin.x;
        self.transform.offset_y = at.y - origin.y;
        true
    }

    /// Ends a drag. Also used when the pointer leaves the surface.
    pub fn pointer_up(&mut self) {
        self.drag_origin = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// Apply a slider value; returns the zoom actually stored.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.transform.zoom = self.zoom_range.apply(zoom);
        self.transform.zoom
    }

    /// Whether a valid viewport has been measured.
    pub fn is_ready(&self) -> bool {
        self.base_scale.is_some()
    }

    pub fn image_size(&self) -> Size {
        self.image
    }

    pub fn viewport(&self) -> Option<Size> {
        self.viewport
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn base_scale(&self) -> Option<f64> {
        self.base_scale
    }

    pub fn effective_scale(&self) -> Option<f64> {
        self.base_scale.map(|s| s * self.transform.zoom)
    }

    pub fn crop_frame(&self) -> Option<Rect> {
        compute_crop_frame(self.viewport?, self.aspect_ratio)
    }

    /// Where the image is currently drawn in viewport space.
    pub fn image_rect(&self) -> Option<Rect> {
        image_rect_in_viewport(
            &self.transform,
            self.base_scale?,
            self.viewport?,
            self.image,
        )
    }

    /// The clamped crop area in source-image pixels, once a viewport is known.
    pub fn crop_area(&self) -> Option<CropArea> {
        viewport_to_image_rect(
            &self.crop_frame()?,
            &self.transform,
            self.base_scale?,
            self.viewport?,
            self.image,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> CropEditor {
        CropEditor::new(Size::new(4000.0, 3000.0), 3.5 / 4.5, ZoomRange::default())
    }

    #[test]
    fn test_not_ready_until_measured() {
        let mut ed = editor();
        assert!(!ed.is_ready());
        assert_eq!(ed.crop_area(), None);

        assert!(!ed.measure_viewport(Size::new(0.0, 0.0)));
        assert_eq!(ed.crop_area(), None);

        assert!(ed.measure_viewport(Size::new(800.0, 500.0)));
        assert!(ed.crop_area().is_some());
    }

    #[test]
    fn test_measure_resets_transform() {
        let mut ed = editor();
        ed.measure_viewport(Size::new(800.0, 500.0));
        ed.set_zoom(2.0);
        ed.pointer_down(Point::new(10.0, 10.0));
        ed.pointer_move(Point::new(50.0, 30.0));

        ed.measure_viewport(Size::new(900.0, 600.0));
        assert_eq!(ed.transform(), Transform::default());
        assert!(!ed.is_dragging());
    }

    #[test]
    fn test_drag_updates_offset() {
        let mut ed = editor();
        ed.measure_viewport(Size::new(800.0, 500.0));

        ed.pointer_down(Point::new(100.0, 100.0));
        assert!(ed.pointer_move(Point::new(130.0, 90.0)));
        assert_eq!(ed.transform().offset(), Point::new(30.0, -10.0));
        ed.pointer_up();

        // Second drag continues from the current offset.
        ed.pointer_down(Point::new(0.0, 0.0));
        ed.pointer_move(Point::new(5.0, 5.0));
        assert_eq!(ed.transform().offset(), Point::new(35.0, -5.0));
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let mut ed = editor();
        ed.measure_viewport(Size::new(800.0, 500.0));
        assert!(!ed.pointer_move(Point::new(300.0, 300.0)));
        assert_eq!(ed.transform().offset(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_offset_is_not_clamped() {
        let mut ed = editor();
        ed.measure_viewport(Size::new(800.0, 500.0));
        ed.pointer_down(Point::new(0.0, 0.0));
        ed.pointer_move(Point::new(10_000.0, 0.0));

        assert_eq!(ed.transform().offset_x, 10_000.0);
        let area = ed.crop_area().unwrap();
        assert!(area.fits_within(ed.image_size()));
        assert_eq!(area.x, 0.0);
    }

    #[test]
    fn test_zoom_is_bounded() {
        let mut ed = editor();
        assert_eq!(ed.set_zoom(10.0), 3.0);
        assert_eq!(ed.set_zoom(0.0), 0.5);
        assert_eq!(ed.set_zoom(1.7), 1.7);
    }

    #[test]
    fn test_effective_scale_tracks_zoom() {
        let mut ed = editor();
        ed.measure_viewport(Size::new(800.0, 500.0));
        let base = ed.base_scale().unwrap();
        ed.set_zoom(2.0);
        assert!((ed.effective_scale().unwrap() - base * 2.0).abs() < 1e-12);
    }
}
