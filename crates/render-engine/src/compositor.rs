//! Caption compositor: draws an image and two captions onto a surface.
//!
//! The compositor is resolution-agnostic. Callers size the surface; caption
//! geometry is derived from the ratio between the surface height and the
//! image's natural height, which is the height captions are authored at.

use std::sync::Arc;

use image::imageops::{overlay, replace, resize, FilterType};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::morphology::{grayscale_dilate, Mask};
use memeforge_common::config::FontConfig;
use memeforge_document_model::{Color, ImageHandle, TextLayer};

use crate::error::{FontError, RenderError};
use crate::glyph::{BitmapFace, GlyphFace, OutlineFace, TextMask};
use crate::surface::Surface;

/// Where and how large one caption lands on a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionLayout {
    /// Horizontal centre in surface pixels.
    pub center_x: f32,

    /// Baseline in surface pixels.
    pub baseline_y: f32,

    /// Glyph size after scaling to the surface.
    pub font_px: f32,

    /// Outline dilation radius in surface pixels (0 = no outline).
    pub stroke_radius: u8,

    /// Line advance width in surface pixels.
    pub advance: f32,

    /// Top-left of the fill mask in surface pixels.
    pub origin: (i32, i32),

    /// Size of the fill mask in pixels.
    pub mask_size: (u32, u32),

    /// Whether the caption, outline included, extends past the left or
    /// right edge. Overflowing captions are drawn clipped, never wrapped.
    pub overflows: bool,
}

/// Largest caption mask, in pixels, the compositor will rasterize.
pub const MAX_CAPTION_PIXELS: u64 = 1 << 26;

struct PreparedCaption {
    layout: CaptionLayout,
    mask: TextMask,
}

/// The pure caption rendering routine.
#[derive(Clone)]
pub struct Compositor {
    face: Arc<dyn GlyphFace>,
}

impl Compositor {
    pub fn new(face: Arc<dyn GlyphFace>) -> Self {
        Self { face }
    }

    /// A compositor using the built-in bitmap face.
    pub fn with_builtin_face() -> Self {
        Self::new(Arc::new(BitmapFace::new()))
    }

    /// A compositor using the configured font file, or the built-in face
    /// when none is configured.
    pub fn from_config(config: &FontConfig) -> Result<Self, FontError> {
        match &config.path {
            Some(path) => Ok(Self::new(Arc::new(OutlineFace::from_file(path)?))),
            None => Ok(Self::with_builtin_face()),
        }
    }

    pub fn face_name(&self) -> &str {
        self.face.name()
    }

    /// Draw `image` scaled to fill `surface`, then `top` and `bottom`.
    ///
    /// Identical inputs at identical surface dimensions always produce
    /// identical pixels.
    pub fn render(
        &self,
        surface: &mut Surface,
        image: &ImageHandle,
        top: &TextLayer,
        bottom: &TextLayer,
    ) -> Result<(), RenderError> {
        check_image(image)?;
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySurface { width, height });
        }

        // Both captions are rasterized before any pixel is touched, so a
        // rejected caption leaves the surface as it was.
        let captions = [
            self.prepare((width, height), image, top)?,
            self.prepare((width, height), image, bottom)?,
        ];

        surface.clear();
        draw_image_filled(surface.pixels_mut(), image);

        for (caption, layer) in captions.iter().zip([top, bottom]) {
            if let Some(caption) = caption {
                draw_caption(surface.pixels_mut(), caption, layer);
            }
        }

        tracing::trace!(
            image = %image.id(),
            width,
            height,
            face = self.face.name(),
            "Composited meme"
        );
        Ok(())
    }

    /// Compute where `layer` would be drawn on a `surface_size` surface.
    ///
    /// Returns `Ok(None)` for empty captions.
    pub fn layout(
        &self,
        surface_size: (u32, u32),
        image: &ImageHandle,
        layer: &TextLayer,
    ) -> Result<Option<CaptionLayout>, RenderError> {
        check_image(image)?;
        Ok(self
            .prepare(surface_size, image, layer)?
            .map(|caption| caption.layout))
    }

    fn prepare(
        &self,
        (width, height): (u32, u32),
        image: &ImageHandle,
        layer: &TextLayer,
    ) -> Result<Option<PreparedCaption>, RenderError> {
        if layer.is_empty() {
            return Ok(None);
        }

        let ratio = height as f32 / image.height() as f32;
        let font_px = layer.font_size * ratio;
        let stroke_radius = if layer.has_stroke() {
            (layer.stroke_width * ratio / 2.0).round().clamp(1.0, 255.0) as u8
        } else {
            0
        };

        let estimate = self.face.raster_area(&layer.content, font_px);
        if !(estimate <= MAX_CAPTION_PIXELS as f64) {
            return Err(RenderError::CaptionTooLarge {
                pixels: estimate.min(u64::MAX as f64) as u64,
                max: MAX_CAPTION_PIXELS,
            });
        }

        let mask = self.face.rasterize_line(&layer.content, font_px);
        let center_x = width as f32 / 2.0;
        let baseline_y = layer.vertical_position * height as f32 / 100.0;
        let pen_x = center_x - mask.advance / 2.0;
        let origin = (
            (pen_x + mask.left as f32).round() as i32,
            (baseline_y + mask.top as f32).round() as i32,
        );
        let mask_size = mask.coverage.dimensions();

        let pad = stroke_radius as i32;
        let ink_left = origin.0 - pad;
        let ink_right = origin.0 + mask_size.0 as i32 + pad;
        let overflows = !mask.is_blank() && (ink_left < 0 || ink_right > width as i32);

        Ok(Some(PreparedCaption {
            layout: CaptionLayout {
                center_x,
                baseline_y,
                font_px,
                stroke_radius,
                advance: mask.advance,
                origin,
                mask_size,
                overflows,
            },
            mask,
        }))
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::with_builtin_face()
    }
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("face", &self.face.name())
            .finish()
    }
}

fn check_image(image: &ImageHandle) -> Result<(), RenderError> {
    if !image.has_valid_dimensions() {
        let (width, height) = image.dimensions();
        return Err(RenderError::InvalidImage { width, height });
    }
    Ok(())
}

/// Draw the image stretched to exactly cover the canvas.
fn draw_image_filled(canvas: &mut RgbaImage, image: &ImageHandle) {
    let (width, height) = canvas.dimensions();
    if image.dimensions() == (width, height) {
        overlay(canvas, image.pixels(), 0, 0);
    } else {
        let scaled = resize(image.pixels(), width, height, FilterType::Triangle);
        overlay(canvas, &scaled, 0, 0);
    }
}

/// Outline first, then fill, both placed from the same mask origin.
fn draw_caption(canvas: &mut RgbaImage, caption: &PreparedCaption, layer: &TextLayer) {
    if caption.mask.is_blank() {
        return;
    }
    let (x, y) = caption.layout.origin;
    let radius = caption.layout.stroke_radius;

    if radius > 0 {
        let outline = dilate_mask(&caption.mask.coverage, radius);
        let pad = radius as i32;
        blend_coverage(canvas, &outline, x - pad, y - pad, layer.stroke_color);
    }
    blend_coverage(canvas, &caption.mask.coverage, x, y, layer.color);
}

/// Grow the mask by `radius` pixels in every direction.
fn dilate_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    let pad = radius as u32;
    let mut padded = GrayImage::new(mask.width() + 2 * pad, mask.height() + 2 * pad);
    replace(&mut padded, mask, pad as i64, pad as i64);
    grayscale_dilate(&padded, &Mask::disk(radius))
}

/// Source-over blend of `color` through `mask` at `(x0, y0)`, clipped to the
/// canvas.
fn blend_coverage(canvas: &mut RgbaImage, mask: &GrayImage, x0: i32, y0: i32, color: Color) {
    if color.is_transparent() {
        return;
    }
    let (width, height) = canvas.dimensions();
    let color_alpha = color.a as f32 / 255.0;

    for (mx, my, coverage) in mask.enumerate_pixels() {
        let coverage = coverage.0[0];
        if coverage == 0 {
            continue;
        }
        let x = x0 + mx as i32;
        let y = y0 + my as i32;
        if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
            continue;
        }
        let alpha = coverage as f32 / 255.0 * color_alpha;
        blend_pixel(canvas.get_pixel_mut(x as u32, y as u32), color, alpha);
    }
}

fn blend_pixel(dst: &mut Rgba<u8>, color: Color, alpha: f32) {
    let dst_alpha = dst.0[3] as f32 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        return;
    }
    let [r, g, b, _] = color.to_array();
    let src = [r, g, b];
    for (channel, src) in dst.0.iter_mut().take(3).zip(src) {
        let value =
            (src as f32 * alpha + *channel as f32 * dst_alpha * (1.0 - alpha)) / out_alpha;
        *channel = value.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}
