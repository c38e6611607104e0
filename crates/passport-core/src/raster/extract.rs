//! Final crop extraction at the fixed output resolution.

use super::{Canvas, CanvasError, RasterSurface};
use crate::color::Rgb;
use crate::decode::{DecodedImage, FilterType};
use crate::geometry::{clamp_crop_area, CropArea, OutputSize, Rect, Size};

/// Extract `area` of `image` scaled to exactly `output`.
///
/// The area is clamped to the image again before drawing. The result is
/// always opaque RGB: any source alpha is dropped.
///
/// # Errors
///
/// Returns `CanvasError::EmptySourceRegion` if the clamped area has no
/// pixels, or an allocation error for an unusable output size.
pub fn extract_crop(
    image: &DecodedImage,
    area: CropArea,
    output: OutputSize,
    filter: FilterType,
) -> Result<DecodedImage, CanvasError> {
    let mut canvas = Canvas::filled(output.width, output.height, Rgb::BLACK)?.with_filter(filter);
    extract_crop_into(&mut canvas, image, area)?;

    tracing::debug!(
        x = area.x,
        y = area.y,
        width = area.width,
        height = area.height,
        output_width = output.width,
        output_height = output.height,
        "extracted crop"
    );
    Ok(canvas.into_opaque_image())
}

/// Draw the clamped `area` of `image` over the whole of `surface`.
pub fn extract_crop_into<S: RasterSurface>(
    surface: &mut S,
    image: &DecodedImage,
    area: CropArea,
) -> Result<(), CanvasError> {
    if image.is_empty() {
        return Err(CanvasError::InvalidSource);
    }
    let bounds = Size::from(image.dimensions());
    let area = clamp_crop_area(area, bounds);
    if area.as_rect().is_empty() {
        return Err(CanvasError::EmptySourceRegion);
    }

    let (width, height) = surface.dimensions();
    surface.draw_image(
        image,
        area.as_rect(),
        Rect::new(0.0, 0.0, width as f64, height as f64),
    )
}


// =============================================================================
// Property-based tests
// =============================================================================
