//! Background compositing and final flattening.
//!
//! Both operations allocate a fresh surface at the output size and never
//! touch their input, so a foreground can be re-composited over any number
//! of colors without accumulating earlier results.

use crate::color::Rgb;
use crate::decode::{DecodedImage, FilterType};
use crate::geometry::{OutputSize, Rect, Size};
use crate::raster::{Canvas, CanvasError, RasterSurface};

/// Largest rectangle with `source`'s aspect ratio that fits in `target`,
/// centered. Returns `None` for degenerate sizes.
pub fn fit_rect(source: Size, target: Size) -> Option<Rect> {
    if !source.is_valid() || !target.is_valid() {
        return None;
    }
    let scale = (target.width / source.width).min(target.height / source.height);
    let width = source.width * scale;
    let height = source.height * scale;
    Some(Rect::new(
        (target.width - width) / 2.0,
        (target.height - height) / 2.0,
        width,
        height,
    ))
}

/// Composite `foreground` source-over a solid `color` at `output` size.
///
/// The foreground is scaled to fit and centered, letterboxed by `color`
/// when the aspect ratios differ. The result is opaque RGB.
///
/// # Errors
///
/// Returns a `CanvasError` if the output surface cannot be allocated or
/// the foreground buffer is malformed.
pub fn composite_over_color(
    foreground: &DecodedImage,
    color: Rgb,
    output: OutputSize,
    filter: FilterType,
) -> Result<DecodedImage, CanvasError> {
    let mut canvas = Canvas::new(output.width, output.height)?.with_filter(filter);
    composite_over_color_into(&mut canvas, foreground, color)?;
    tracing::debug!(color = %color, "composited over background color");
    Ok(canvas.into_opaque_image())
}

/// Fill `surface` with `color`, then draw `foreground` fitted on top.
pub fn composite_over_color_into<S: RasterSurface>(
    surface: &mut S,
    foreground: &DecodedImage,
    color: Rgb,
) -> Result<(), CanvasError> {
    if foreground.is_empty() {
        return Err(CanvasError::InvalidSource);
    }
    let (width, height) = surface.dimensions();
    let target = Size::from((width, height));
    surface.fill_rect(Rect::new(0.0, 0.0, target.width, target.height), color.with_alpha(255));

    let source = Size::from(foreground.dimensions());
    let dst = fit_rect(source, target).ok_or(CanvasError::InvalidSource)?;
    surface.draw_image(
        foreground,
        Rect::new(0.0, 0.0, source.width, source.height),
        dst,
    )
}

/// Draw `image` unscaled at the origin of an opaque `output`-sized canvas.
///
/// Pixels outside the image stay black and transparent pixels are blended
/// onto black. Used right before encoding so every export has exactly the
/// output dimensions.
pub fn flatten(image: &DecodedImage, output: OutputSize) -> Result<DecodedImage, CanvasError> {
    if image.is_empty() {
        return Err(CanvasError::InvalidSource);
    }
    if image.dimensions() != (output.width, output.height) {
        tracing::debug!(
            width = image.width,
            height = image.height,
            output_width = output.width,
            output_height = output.height,
            "flattening image that does not match the output size"
        );
    }

    let mut canvas = Canvas::filled(output.width, output.height, Rgb::BLACK)?;
    let rect = Rect::new(0.0, 0.0, image.width as f64, image.height as f64);
    canvas.draw_image(image, rect, rect)?;
    Ok(canvas.into_opaque_image())
}


// =============================================================================
// Property-based tests
// =============================================================================
