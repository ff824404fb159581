//! Text rasterization backends.
//!
//! A [`GlyphFace`] turns one line of text into a coverage mask positioned
//! relative to the pen origin on the baseline. The compositor derives both
//! the fill and the outline from that single mask, so the two passes can
//! never drift apart.

use std::path::Path;

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use image::imageops::{resize, FilterType};
use image::{GrayImage, Luma};

use crate::error::FontError;

/// Rasterized coverage of one line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMask {
    /// Per-pixel coverage, 0 = none, 255 = full.
    pub coverage: GrayImage,

    /// Pen-relative x of column 0.
    pub left: i32,

    /// Baseline-relative y of row 0 (negative is above the baseline).
    pub top: i32,

    /// Horizontal advance of the whole line in pixels.
    pub advance: f32,
}

impl TextMask {
    /// A mask that draws nothing but still advances the pen.
    pub fn empty(advance: f32) -> Self {
        Self {
            coverage: GrayImage::new(0, 0),
            left: 0,
            top: 0,
            advance,
        }
    }

    /// Whether the mask has no pixels to draw.
    pub fn is_blank(&self) -> bool {
        self.coverage.width() == 0 || self.coverage.height() == 0
    }
}

/// A text shaping and rasterization backend.
///
/// Implementations must be deterministic: the same text at the same size
/// always yields the same mask.
pub trait GlyphFace: Send + Sync {
    /// Human-readable face name for diagnostics.
    fn name(&self) -> &str;

    /// Rasterize a single line at `px_size` pixels per em.
    fn rasterize_line(&self, text: &str, px_size: f32) -> TextMask;

    /// Upper estimate of the pixels [`rasterize_line`](Self::rasterize_line)
    /// would allocate, checked before any allocation happens.
    fn raster_area(&self, text: &str, px_size: f32) -> f64 {
        let chars = text.chars().count() as f64;
        let px = px_size.max(0.0) as f64;
        // Advance of at most one em per glyph, line box of at most 1.5 em.
        chars * px * px * 1.5
    }
}

/// Captions are single-line; control characters become spaces.
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

// ---------------------------------------------------------------------------
// Built-in bitmap face
// ---------------------------------------------------------------------------

/// The built-in 10x20 monospace bitmap face, scaled to the requested size.
///
/// Needs no font files, which keeps headless hosts and tests
/// self-contained. Characters outside ASCII render as `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapFace;

impl BitmapFace {
    pub fn new() -> Self {
        Self
    }
}

/// Adapts a grayscale mask to an embedded-graphics draw target.
struct MaskTarget<'a>(&'a mut GrayImage);

impl OriginDimensions for MaskTarget<'_> {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

impl DrawTarget for MaskTarget<'_> {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.0.dimensions();
        for Pixel(at, color) in pixels {
            if color.is_on()
                && at.x >= 0
                && at.y >= 0
                && (at.x as u32) < width
                && (at.y as u32) < height
            {
                self.0.put_pixel(at.x as u32, at.y as u32, Luma([255]));
            }
        }
        Ok(())
    }
}

impl GlyphFace for BitmapFace {
    fn name(&self) -> &str {
        "builtin-10x20"
    }

    fn rasterize_line(&self, text: &str, px_size: f32) -> TextMask {
        let line = single_line(text);
        let chars = line.chars().count() as u32;
        if chars == 0 || !(px_size > 0.0) {
            return TextMask::empty(0.0);
        }

        let cell = FONT_10X20.character_size;
        let spacing = FONT_10X20.character_spacing;
        let native_width = chars * cell.width + (chars - 1) * spacing;

        let mut native = GrayImage::new(native_width, cell.height);
        let style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        let _ = Text::with_baseline(&line, Point::zero(), style, Baseline::Top)
            .draw(&mut MaskTarget(&mut native));

        let scale = px_size / cell.height as f32;
        let width = ((native_width as f32 * scale).round() as u32).max(1);
        let height = ((cell.height as f32 * scale).round() as u32).max(1);
        let coverage = if (width, height) == native.dimensions() {
            native
        } else {
            resize(&native, width, height, FilterType::Triangle)
        };

        TextMask {
            coverage,
            left: 0,
            top: -((FONT_10X20.baseline as f32 * scale).round() as i32),
            advance: width as f32,
        }
    }

    fn raster_area(&self, text: &str, px_size: f32) -> f64 {
        let chars = text.chars().count() as f64;
        let cell = FONT_10X20.character_size;
        let cell_w = (cell.width + FONT_10X20.character_spacing) as f64;
        let cell_h = cell.height as f64;
        let scale = px_size.max(0.0) as f64 / cell_h;
        // The native line is drawn first, then resized.
        let native = chars * cell_w * cell_h;
        native + chars * cell_w * scale * cell_h * scale
    }
}

// ---------------------------------------------------------------------------
// Outline (TrueType/OpenType) face
// ---------------------------------------------------------------------------

/// A scalable outline font loaded through `ab_glyph`.
#[derive(Clone)]
pub struct OutlineFace {
    name: String,
    font: FontArc,
}

impl OutlineFace {
    /// Parse font data held in memory.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self, FontError> {
        let name = name.into();
        let font = FontArc::try_from_vec(data).map_err(|source| FontError::Invalid {
            name: name.clone(),
            source,
        })?;
        Ok(Self { name, font })
    }

    /// Load a `.ttf`/`.otf` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let face = Self::from_bytes(name, data)?;
        tracing::debug!(font = %face.name, path = %path.display(), "Loaded outline font");
        Ok(face)
    }
}

impl std::fmt::Debug for OutlineFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineFace")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl GlyphFace for OutlineFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn rasterize_line(&self, text: &str, px_size: f32) -> TextMask {
        if !(px_size > 0.0) {
            return TextMask::empty(0.0);
        }

        let scale = PxScale::from(px_size);
        let scaled = self.font.as_scaled(scale);

        let mut pen = 0.0f32;
        let mut previous = None;
        let mut outlined = Vec::new();
        for c in single_line(text).chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                pen += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(pen, 0.0));
            pen += scaled.h_advance(id);
            previous = Some(id);
            if let Some(outline) = self.font.outline_glyph(glyph) {
                outlined.push(outline);
            }
        }

        if outlined.is_empty() {
            return TextMask::empty(pen);
        }

        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for outline in &outlined {
            let bounds = outline.px_bounds();
            min_x = min_x.min(bounds.min.x.floor() as i32);
            min_y = min_y.min(bounds.min.y.floor() as i32);
            max_x = max_x.max(bounds.max.x.ceil() as i32);
            max_y = max_y.max(bounds.max.y.ceil() as i32);
        }

        let width = (max_x - min_x).max(1) as u32;
        let height = (max_y - min_y).max(1) as u32;
        let mut coverage = GrayImage::new(width, height);
        for outline in &outlined {
            let bounds = outline.px_bounds();
            let offset_x = bounds.min.x.floor() as i32 - min_x;
            let offset_y = bounds.min.y.floor() as i32 - min_y;
            outline.draw(|x, y, c| {
                let px = offset_x + x as i32;
                let py = offset_y + y as i32;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let value = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = coverage.get_pixel_mut(px as u32, py as u32);
                pixel.0[0] = pixel.0[0].saturating_add(value);
            });
        }

        TextMask {
            coverage,
            left: min_x,
            top: min_y,
            advance: pen,
        }
    }
}
