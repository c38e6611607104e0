//! Pure geometry functions for the crop editor.
//!
//! Every function here is deterministic and allocation-free. Functions that
//! depend on a measured viewport return `None` until the measurement is
//! valid, so callers defer work instead of computing with zero sizes.

use super::{CropArea, Rect, Size, Transform};

/// Fraction of the viewport the image occupies at zoom 1.
pub const BASE_FIT_RATIO: f64 = 0.9;

/// Fraction of the binding viewport dimension the crop frame occupies.
pub const FRAME_FILL_RATIO: f64 = 0.8;

/// Scale that fits the whole image inside 90% of the viewport.
///
/// Returns `None` if either size is zero, negative or non-finite.
pub fn compute_base_scale(image: Size, viewport: Size) -> Option<f64> {
    if !image.is_valid() || !viewport.is_valid() {
        return None;
    }
    let scale_x = viewport.width * BASE_FIT_RATIO / image.width;
    let scale_y = viewport.height * BASE_FIT_RATIO / image.height;
    let scale = scale_x.min(scale_y);
    (scale > 0.0 && scale.is_finite()).then_some(scale)
}

/// Fixed-aspect crop frame centered in the viewport.
///
/// `aspect_ratio` is width / height. The frame is as wide as 80% of the
/// viewport width allows, unless 80% of the viewport height is the tighter
/// bound once converted through the aspect ratio.
pub fn compute_crop_frame(viewport: Size, aspect_ratio: f64) -> Option<Rect> {
    if !viewport.is_valid() || !(aspect_ratio > 0.0 && aspect_ratio.is_finite()) {
        return None;
    }
    let width = (viewport.width * FRAME_FILL_RATIO)
        .min(viewport.height * FRAME_FILL_RATIO * aspect_ratio);
    let height = width / aspect_ratio;
    let center = viewport.center();
    Some(Rect::new(
        center.x - width / 2.0,
        center.y - height / 2.0,
        width,
        height,
    ))
}

/// Where the transformed image is drawn in viewport space.
pub fn image_rect_in_viewport(
    transform: &Transform,
    base_scale: f64,
    viewport: Size,
    image: Size,
) -> Option<Rect> {
    let scale = effective_scale(transform, base_scale)?;
    let width = image.width * scale;
    let height = image.height * scale;
    let center = viewport.center();
    Some(Rect::new(
        center.x + transform.offset_x - width / 2.0,
        center.y + transform.offset_y - height / 2.0,
        width,
        height,
    ))
}

/// Map the viewport crop frame into source-image pixels, clamped to the
/// image bounds.
///
/// Clamping shifts the origin first and then truncates the size; an
/// out-of-bounds frame is corrected, never rejected.
pub fn viewport_to_image_rect(
    frame: &Rect,
    transform: &Transform,
    base_scale: f64,
    viewport: Size,
    image: Size,
) -> Option<CropArea> {
    if !image.is_valid() {
        return None;
    }
    let scale = effective_scale(transform, base_scale)?;
    let image_rect = image_rect_in_viewport(transform, base_scale, viewport, image)?;

    let raw = CropArea::new(
        (frame.x - image_rect.x) / scale,
        (frame.y - image_rect.y) / scale,
        frame.width / scale,
        frame.height / scale,
    );
    Some(clamp_crop_area(raw, image))
}

/// Inverse of [`viewport_to_image_rect`] (without clamping): where a crop
/// area of the image currently appears in the viewport.
pub fn image_to_viewport_rect(
    area: &CropArea,
    transform: &Transform,
    base_scale: f64,
    viewport: Size,
    image: Size,
) -> Option<Rect> {
    let scale = effective_scale(transform, base_scale)?;
    let image_rect = image_rect_in_viewport(transform, base_scale, viewport, image)?;
    Some(Rect::new(
        image_rect.x + area.x * scale,
        image_rect.y + area.y * scale,
        area.width * scale,
        area.height * scale,
    ))
}

/// Shift, then truncate, `area` so it lies within `image`.
///
/// The origin is clamped against `image - area size` first; a crop larger
/// than the image therefore starts at 0 and is cut to the image size.
pub fn clamp_crop_area(area: CropArea, image: Size) -> CropArea {
    let x = area.x.min(image.width - area.width).max(0.0);
    let y = area.y.min(image.height - area.height).max(0.0);
    let width = area.width.min(image.width - x).max(0.0);
    let height = area.height.min(image.height - y).max(0.0);
    CropArea::new(x, y, width, height)
}

fn effective_scale(transform: &Transform, base_scale: f64) -> Option<f64> {
    let scale = base_scale * transform.zoom;
    (scale > 0.0 && scale.is_finite()).then_some(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSPORT_ASPECT: f64 = 3.5 / 4.5;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_base_scale_landscape() {
        let scale = compute_base_scale(Size::new(4000.0, 3000.0), Size::new(800.0, 500.0)).unwrap();
        // min(720 / 4000, 450 / 3000) = min(0.18, 0.15)
        assert!(approx(scale, 0.15));
    }

    #[test]
    fn test_base_scale_defers_on_zero_viewport() {
        assert_eq!(compute_base_scale(Size::new(100.0, 100.0), Size::new(0.0, 0.0)), None);
        assert_eq!(compute_base_scale(Size::new(0.0, 100.0), Size::new(800.0, 500.0)), None);
    }

    #[test]
    fn test_crop_frame_height_bound() {
        // 800x500: min(640, 400 * 0.777..) = 311.1
        let frame = compute_crop_frame(Size::new(800.0, 500.0), PASSPORT_ASPECT).unwrap();
        assert!(approx(frame.width, 400.0 * PASSPORT_ASPECT));
        assert!(approx(frame.height, 400.0));
        assert!(approx(frame.x + frame.width / 2.0, 400.0));
        assert!(approx(frame.y, 50.0));
    }

    #[test]
    fn test_crop_frame_width_bound() {
        // Tall narrow viewport: width is binding.
        let frame = compute_crop_frame(Size::new(200.0, 1000.0), PASSPORT_ASPECT).unwrap();
        assert!(approx(frame.width, 160.0));
        assert!(approx(frame.height, 160.0 / PASSPORT_ASPECT));
        assert!(approx(frame.x, 20.0));
    }

    #[test]
    fn test_crop_frame_defers_on_zero_viewport() {
        assert_eq!(compute_crop_frame(Size::new(0.0, 500.0), PASSPORT_ASPECT), None);
        assert_eq!(compute_crop_frame(Size::new(800.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_centered_crop_maps_to_image_center() {
        let viewport = Size::new(800.0, 500.0);
        let image = Size::new(4000.0, 3000.0);
        let base = compute_base_scale(image, viewport).unwrap();
        let frame = compute_crop_frame(viewport, PASSPORT_ASPECT).unwrap();

        let area =
            viewport_to_image_rect(&frame, &Transform::default(), base, viewport, image).unwrap();

        // Frame is 400 tall at scale 0.15 → 2666.67 image pixels tall.
        assert!(approx(area.height, 400.0 / 0.15));
        assert!(approx(area.width / area.height, PASSPORT_ASPECT));
        assert!(approx(area.x + area.width / 2.0, 2000.0));
        assert!(approx(area.y + area.height / 2.0, 1500.0));
    }

    #[test]
    fn test_pan_moves_crop_opposite_direction() {
        let viewport = Size::new(800.0, 500.0);
        let image = Size::new(4000.0, 3000.0);
        let base = compute_base_scale(image, viewport).unwrap();
        let frame = compute_crop_frame(viewport, PASSPORT_ASPECT).unwrap();

        let centered =
            viewport_to_image_rect(&frame, &Transform::default(), base, viewport, image).unwrap();
        // Dragging the image right by 30px shows content further left.
        let panned = viewport_to_image_rect(
            &frame,
            &Transform::new(1.0, 30.0, 0.0),
            base,
            viewport,
            image,
        )
        .unwrap();
        assert!(approx(centered.x - panned.x, 30.0 / 0.15));
    }

    #[test]
    fn test_zoom_shrinks_crop_area() {
        let viewport = Size::new(800.0, 500.0);
        let image = Size::new(4000.0, 3000.0);
        let base = compute_base_scale(image, viewport).unwrap();
        let frame = compute_crop_frame(viewport, PASSPORT_ASPECT).unwrap();

        let z1 = viewport_to_image_rect(&frame, &Transform::default(), base, viewport, image)
            .unwrap();
        let z2 = viewport_to_image_rect(
            &frame,
            &Transform::new(2.0, 0.0, 0.0),
            base,
            viewport,
            image,
        )
        .unwrap();
        assert!(approx(z2.width * 2.0, z1.width));
    }

    #[test]
    fn test_clamp_shifts_origin_into_bounds() {
        let image = Size::new(100.0, 100.0);
        let clamped = clamp_crop_area(CropArea::new(-20.0, 90.0, 30.0, 30.0), image);
        assert_eq!(clamped, CropArea::new(0.0, 70.0, 30.0, 30.0));
    }

    #[test]
    fn test_clamp_truncates_oversized_area() {
        let image = Size::new(100.0, 50.0);
        let clamped = clamp_crop_area(CropArea::new(10.0, 10.0, 300.0, 80.0), image);
        assert_eq!(clamped, CropArea::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_image_fully_off_frame_is_corrected() {
        let viewport = Size::new(800.0, 500.0);
        let image = Size::new(1000.0, 1000.0);
        let base = compute_base_scale(image, viewport).unwrap();
        let frame = compute_crop_frame(viewport, PASSPORT_ASPECT).unwrap();

        let area = viewport_to_image_rect(
            &frame,
            &Transform::new(1.0, 5000.0, -5000.0),
            base,
            viewport,
            image,
        )
        .unwrap();
        assert!(area.fits_within(image));
        assert!(area.width > 0.0 && area.height > 0.0);
    }

    #[test]
    fn test_image_to_viewport_inverts_mapping() {
        let viewport = Size::new(800.0, 500.0);
        let image = Size::new(4000.0, 3000.0);
        let base = compute_base_scale(image, viewport).unwrap();
        let frame = compute_crop_frame(viewport, PASSPORT_ASPECT).unwrap();
        let transform = Transform::new(1.5, -12.0, 7.0);

        let area = viewport_to_image_rect(&frame, &transform, base, viewport, image).unwrap();
        let back = image_to_viewport_rect(&area, &transform, base, viewport, image).unwrap();

        assert!(approx(back.x, frame.x));
        assert!(approx(back.y, frame.y));
        assert!(approx(back.width, frame.width));
        assert!(approx(back.height, frame.height));
    }

    #[test]
    fn test_non_positive_scale_is_rejected() {
        let frame = Rect::new(0.0, 0.0, 10.0, 10.0);
        let viewport = Size::new(100.0, 100.0);
        let image = Size::new(100.0, 100.0);
        assert!(viewport_to_image_rect(&frame, &Transform::default(), 0.0, viewport, image).is_none());
        assert!(
            viewport_to_image_rect(&frame, &Transform::new(0.0, 0.0, 0.0), 1.0, viewport, image)
                .is_none()
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn size_strategy() -> impl Strategy<Value = Size> {
        (1.0f64..=8000.0, 1.0f64..=8000.0).prop_map(|(w, h)| Size::new(w, h))
    }

    fn viewport_strategy() -> impl Strategy<Value = Size> {
        (50.0f64..=2000.0, 50.0f64..=2000.0).prop_map(|(w, h)| Size::new(w, h))
    }

    fn transform_strategy() -> impl Strategy<Value = Transform> {
        (0.5f64..=3.0, -5000.0f64..=5000.0, -5000.0f64..=5000.0)
            .prop_map(|(zoom, x, y)| Transform::new(zoom, x, y))
    }

    proptest! {
        /// Property: base scale is positive and fits the image in 90% of the viewport.
        #[test]
        fn prop_base_scale_fits(image in size_strategy(), viewport in viewport_strategy()) {
            let scale = compute_base_scale(image, viewport).unwrap();
            prop_assert!(scale > 0.0);
            prop_assert!(image.width * scale <= viewport.width * BASE_FIT_RATIO + 1e-6);
            prop_assert!(image.height * scale <= viewport.height * BASE_FIT_RATIO + 1e-6);
        }

        /// Property: the crop frame keeps its aspect ratio and stays inside the viewport.
        #[test]
        fn prop_crop_frame_inside_viewport(
            viewport in viewport_strategy(),
            aspect in 0.2f64..=5.0,
        ) {
            let frame = compute_crop_frame(viewport, aspect).unwrap();
            prop_assert!((frame.width / frame.height - aspect).abs() < 1e-9);
            prop_assert!(frame.x >= 0.0 && frame.y >= 0.0);
            prop_assert!(frame.right() <= viewport.width + 1e-9);
            prop_assert!(frame.bottom() <= viewport.height + 1e-9);
        }

        /// Property: any transform in range yields a crop area inside the image.
        #[test]
        fn prop_crop_area_within_image(
            image in size_strategy(),
            viewport in viewport_strategy(),
            transform in transform_strategy(),
        ) {
            let base = compute_base_scale(image, viewport).unwrap();
            let frame = compute_crop_frame(viewport, 3.5 / 4.5).unwrap();
            let area = viewport_to_image_rect(&frame, &transform, base, viewport, image).unwrap();

            prop_assert!(area.x >= 0.0);
            prop_assert!(area.y >= 0.0);
            prop_assert!(area.x + area.width <= image.width + 1e-6);
            prop_assert!(area.y + area.height <= image.height + 1e-6);
            prop_assert!(area.width > 0.0 && area.height > 0.0);
        }

        /// Property: clamping is idempotent.
        #[test]
        fn prop_clamp_idempotent(
            image in size_strategy(),
            (x, y, w, h) in (-9000.0f64..=9000.0, -9000.0f64..=9000.0, 0.0f64..=9000.0, 0.0f64..=9000.0),
        ) {
            let once = clamp_crop_area(CropArea::new(x, y, w, h), image);
            let twice = clamp_crop_area(once, image);
            prop_assert!((once.x - twice.x).abs() < 1e-6);
            prop_assert!((once.y - twice.y).abs() < 1e-6);
            prop_assert!((once.width - twice.width).abs() < 1e-6);
            prop_assert!((once.height - twice.height).abs() < 1e-6);
        }
    }
}
