//! In-memory RGBA canvas backed by the `image` crate.

use image::imageops;
use image::{Rgba, RgbaImage};

use super::{CanvasError, RasterSurface};
use crate::color::Rgb;
use crate::decode::{DecodedImage, FilterType, PixelLayout};
use crate::geometry::Rect;

/// Largest edge a canvas may have, matching common browser limits.
pub const MAX_CANVAS_DIMENSION: u32 = 16_384;

/// A CPU raster surface with straight-alpha RGBA pixels.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    filter: FilterType,
}

impl Canvas {
    /// Allocate a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 || width > MAX_CANVAS_DIMENSION || height > MAX_CANVAS_DIMENSION
        {
            return Err(CanvasError::Allocation { width, height });
        }
        tracing::trace!(width, height, "allocating canvas");
        Ok(Self {
            pixels: RgbaImage::new(width, height),
            filter: FilterType::Bilinear,
        })
    }

    /// Allocate a canvas filled with an opaque color.
    pub fn filled(width: u32, height: u32, color: Rgb) -> Result<Self, CanvasError> {
        let mut canvas = Self::new(width, height)?;
        for px in canvas.pixels.pixels_mut() {
            *px = color.with_alpha(255);
        }
        Ok(canvas)
    }

    /// Resampling filter used when `draw_image` scales.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// The canvas contents, alpha included.
    pub fn into_image(self) -> DecodedImage {
        DecodedImage::from_rgba_image(self.pixels)
    }

    /// The canvas contents with alpha discarded.
    pub fn into_opaque_image(self) -> DecodedImage {
        DecodedImage::from_rgb_image(image::DynamicImage::ImageRgba8(self.pixels).into_rgb8())
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.pixels.width() as f64,
            self.pixels.height() as f64,
        )
    }
}

impl RasterSurface for Canvas {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let Some(visible) = rect.intersect(&self.bounds()) else {
            return;
        };
        let x0 = visible.x.round() as u32;
        let y0 = visible.y.round() as u32;
        let x1 = (visible.right().round() as u32).min(self.pixels.width());
        let y1 = (visible.bottom().round() as u32).min(self.pixels.height());

        for y in y0..y1 {
            for x in x0..x1 {
                let px = self.pixels.get_pixel_mut(x, y);
                *px = source_over(*px, color);
            }
        }
    }

    fn draw_image(
        &mut self,
        image: &DecodedImage,
        src: Rect,
        dst: Rect,
    ) -> Result<(), CanvasError> {
        if image.is_empty()
            || image.pixels.len()
                != image.width as usize * image.height as usize * image.layout.channels()
        {
            return Err(CanvasError::InvalidSource);
        }
        if src.is_empty() || dst.is_empty() {
            return Ok(());
        }

        let scale_x = dst.width / src.width;
        let scale_y = dst.height / src.height;

        // Drop parts of the source outside the image, keeping the mapping.
        let image_bounds = Rect::new(0.0, 0.0, image.width as f64, image.height as f64);
        let src_in = src
            .intersect(&image_bounds)
            .ok_or(CanvasError::EmptySourceRegion)?;
        let dst_in = Rect::new(
            dst.x + (src_in.x - src.x) * scale_x,
            dst.y + (src_in.y - src.y) * scale_y,
            src_in.width * scale_x,
            src_in.height * scale_y,
        );

        // Drop parts of the destination outside the surface.
        let Some(dst_vis) = dst_in.intersect(&self.bounds()) else {
            return Ok(());
        };
        let src_vis = Rect::new(
            src_in.x + (dst_vis.x - dst_in.x) / scale_x,
            src_in.y + (dst_vis.y - dst_in.y) / scale_y,
            dst_vis.width / scale_x,
            dst_vis.height / scale_y,
        );

        let dx0 = dst_vis.x.round() as i64;
        let dy0 = dst_vis.y.round() as i64;
        let dw = (dst_vis.right().round() as i64 - dx0).max(0) as u32;
        let dh = (dst_vis.bottom().round() as i64 - dy0).max(0) as u32;
        if dw == 0 || dh == 0 {
            return Ok(());
        }

        let (sx, sw) = pixel_span(src_vis.x, src_vis.right(), image.width);
        let (sy, sh) = pixel_span(src_vis.y, src_vis.bottom(), image.height);

        let region = copy_region(image, sx, sy, sw, sh);
        let scaled = if (sw, sh) == (dw, dh) {
            region
        } else {
            imageops::resize(&region, dw, dh, self.filter.to_image_filter())
        };

        let (width, height) = self.pixels.dimensions();
        for (x, y, px) in scaled.enumerate_pixels() {
            let (tx, ty) = (dx0 + x as i64, dy0 + y as i64);
            if tx < 0 || ty < 0 || tx >= width as i64 || ty >= height as i64 {
                continue;
            }
            let dst = self.pixels.get_pixel_mut(tx as u32, ty as u32);
            *dst = source_over(*dst, *px);
        }
        Ok(())
    }
}

/// Straight-alpha source-over. An opaque destination stays opaque.
fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src.0[3] as u32;
    let da = dst.0[3] as u32;
    if sa == 255 || da == 0 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    // Alpha scaled by 255 * 255 to stay in integers.
    let dst_weight = da * (255 - sa);
    let out_a = sa * 255 + dst_weight;
    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = src.0[c] as u32 * sa * 255 + dst.0[c] as u32 * dst_weight;
        out[c] = ((value + out_a / 2) / out_a) as u8;
    }
    out[3] = ((out_a + 127) / 255) as u8;
    Rgba(out)
}

/// Whole-pixel span `[start, start + len)` covering `[lo, hi)`, kept
/// inside `0..limit` and at least one pixel long.
fn pixel_span(lo: f64, hi: f64, limit: u32) -> (u32, u32) {
    // Snap values within float noise of an integer before floor/ceil.
    let snap = |v: f64| {
        let r = v.round();
        if (v - r).abs() < 1e-6 {
            r
        } else {
            v
        }
    };
    let start = (snap(lo).floor().max(0.0) as u32).min(limit - 1);
    let end = (snap(hi).ceil().max(0.0) as u32).clamp(start + 1, limit);
    (start, end - start)
}

/// Copy a pixel region into a standalone RGBA buffer, row by row.
fn copy_region(image: &DecodedImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    let channels = image.layout.channels();
    let mut out = RgbaImage::new(width, height);

    for row in 0..height {
        let src_row = ((y + row) as usize * image.width as usize + x as usize) * channels;
        let src = &image.pixels[src_row..src_row + width as usize * channels];
        for (col, px) in src.chunks_exact(channels).enumerate() {
            let rgba = match image.layout {
                PixelLayout::Rgb8 => Rgba([px[0], px[1], px[2], 255]),
                PixelLayout::Rgba8 => Rgba([px[0], px[1], px[2], px[3]]),
            };
            out.put_pixel(col as u32, row, rgba);
        }
    }
    out
}
