//! Caption content and style.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Default caption size in pixels at the image's natural height.
pub const DEFAULT_FONT_SIZE: f32 = 48.0;

/// Default outline width in pixels at the image's natural height.
pub const DEFAULT_STROKE_WIDTH: f32 = 3.0;

/// Default baseline of the top caption, percent of image height.
pub const DEFAULT_TOP_POSITION: f32 = 15.0;

/// Default baseline of the bottom caption, percent of image height.
pub const DEFAULT_BOTTOM_POSITION: f32 = 85.0;

/// One caption: its text and how it is drawn.
///
/// A layer is fully self-describing. Rendering one layer never reads the
/// other layer's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TextLayerFields")]
pub struct TextLayer {
    /// Caption text. Empty text renders nothing.
    pub content: String,

    /// Glyph size in pixels, authored against the image's natural height.
    pub font_size: f32,

    /// Fill colour.
    pub color: Color,

    /// Outline colour.
    pub stroke_color: Color,

    /// Outline width in pixels at natural height (0 = no outline).
    pub stroke_width: f32,

    /// Baseline position, percent of image height in `[0, 100]`.
    pub vertical_position: f32,
}

/// Rejected caption field value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayerError {
    #[error("font size must be a positive finite number, got {0}")]
    InvalidFontSize(f32),

    #[error("stroke width must be a non-negative finite number, got {0}")]
    InvalidStrokeWidth(f32),

    #[error("vertical position must be a finite number, got {0}")]
    InvalidVerticalPosition(f32),
}

/// Unvalidated wire form of [`TextLayer`]; deserialisation goes through the
/// same setters as interactive edits.
#[derive(Deserialize)]
struct TextLayerFields {
    content: String,
    font_size: f32,
    color: Color,
    stroke_color: Color,
    stroke_width: f32,
    vertical_position: f32,
}

impl TryFrom<TextLayerFields> for TextLayer {
    type Error = LayerError;

    fn try_from(fields: TextLayerFields) -> Result<Self, Self::Error> {
        let mut layer = TextLayer::at(DEFAULT_TOP_POSITION).with_content(fields.content);
        layer.set_font_size(fields.font_size)?;
        layer.set_color(fields.color);
        layer.set_stroke_color(fields.stroke_color);
        layer.set_stroke_width(fields.stroke_width)?;
        layer.set_vertical_position(fields.vertical_position)?;
        Ok(layer)
    }
}

impl TextLayer {
    /// A caption with default style whose baseline sits at `vertical_position`.
    pub fn at(vertical_position: f32) -> Self {
        Self {
            content: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            color: Color::WHITE,
            stroke_color: Color::BLACK,
            stroke_width: DEFAULT_STROKE_WIDTH,
            vertical_position: vertical_position.clamp(0.0, 100.0),
        }
    }

    /// Default top caption.
    pub fn top() -> Self {
        Self::at(DEFAULT_TOP_POSITION)
    }

    /// Default bottom caption.
    pub fn bottom() -> Self {
        Self::at(DEFAULT_BOTTOM_POSITION)
    }

    /// Builder-style content setter.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Whether the caption contributes any pixels.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether an outline pass is drawn.
    pub fn has_stroke(&self) -> bool {
        self.stroke_width > 0.0
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_font_size(&mut self, font_size: f32) -> Result<(), LayerError> {
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(LayerError::InvalidFontSize(font_size));
        }
        self.font_size = font_size;
        Ok(())
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = color;
    }

    pub fn set_stroke_width(&mut self, stroke_width: f32) -> Result<(), LayerError> {
        if !stroke_width.is_finite() || stroke_width < 0.0 {
            return Err(LayerError::InvalidStrokeWidth(stroke_width));
        }
        self.stroke_width = stroke_width;
        Ok(())
    }

    /// Set the baseline position. Finite values are clamped into `[0, 100]`.
    pub fn set_vertical_position(&mut self, position: f32) -> Result<(), LayerError> {
        if !position.is_finite() {
            return Err(LayerError::InvalidVerticalPosition(position));
        }
        self.vertical_position = position.clamp(0.0, 100.0);
        Ok(())
    }
}

impl Default for TextLayer {
    fn default() -> Self {
        Self::top()
    }
}
