//! Live preview rendering.
//!
//! The preview surface keeps the image's native pixel size so that preview
//! and export share every rendering parameter; only the size it is shown at
//! is clamped to the display bounds.

use std::sync::Arc;

use memeforge_common::config::PreviewDefaults;
use memeforge_document_model::MemeDocument;

use crate::compositor::Compositor;
use crate::error::RenderError;
use crate::surface::Surface;

/// Maximum on-screen size of the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBounds {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl DisplayBounds {
    pub const UNBOUNDED: DisplayBounds = DisplayBounds {
        max_width: None,
        max_height: None,
    };

    /// Fit `(width, height)` inside the bounds, keeping the aspect ratio.
    /// Never upscales and never returns a zero dimension.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (width, height);
        }
        let scale_w = self
            .max_width
            .map_or(1.0, |max| max.max(1) as f64 / width as f64);
        let scale_h = self
            .max_height
            .map_or(1.0, |max| max.max(1) as f64 / height as f64);
        let scale = scale_w.min(scale_h).min(1.0);
        if scale >= 1.0 {
            return (width, height);
        }
        (
            ((width as f64 * scale).round() as u32).max(1),
            ((height as f64 * scale).round() as u32).max(1),
        )
    }
}

impl From<&PreviewDefaults> for DisplayBounds {
    fn from(defaults: &PreviewDefaults) -> Self {
        Self {
            max_width: defaults.max_display_width,
            max_height: Some(defaults.max_display_height),
        }
    }
}

/// What the preview currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewStatus {
    /// No image is loaded; the host shows its placeholder.
    Empty,
    /// The surface holds an up-to-date composite.
    Ready,
    /// The last render failed; no preview is available.
    Unavailable { reason: String },
}

/// Result of one [`PreviewController::refresh`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewUpdate {
    /// Nothing changed since the last refresh.
    Unchanged,
    /// The surface was re-rendered.
    Rendered,
    /// No image is loaded; the surface was dropped.
    Cleared,
    /// Rendering failed; the preview is unavailable until the next change.
    Failed(RenderError),
}

/// Keeps an on-screen surface in sync with the document.
///
/// Any number of [`invalidate`](Self::invalidate) calls between two
/// [`refresh`](Self::refresh) calls coalesce into a single render, and that
/// render always reads the document as it is when `refresh` runs.
#[derive(Debug)]
pub struct PreviewController {
    compositor: Arc<Compositor>,
    bounds: DisplayBounds,
    surface: Option<Surface>,
    status: PreviewStatus,
    stale: bool,
    render_count: u64,
}

impl PreviewController {
    pub fn new(compositor: Arc<Compositor>, bounds: DisplayBounds) -> Self {
        Self {
            compositor,
            bounds,
            surface: None,
            status: PreviewStatus::Empty,
            stale: true,
            render_count: 0,
        }
    }

    /// Mark the preview out of date.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Re-render if anything changed since the last refresh.
    pub fn refresh(&mut self, document: &MemeDocument) -> PreviewUpdate {
        if !self.stale {
            return PreviewUpdate::Unchanged;
        }
        self.stale = false;

        let Some(image) = &document.image else {
            self.surface = None;
            self.status = PreviewStatus::Empty;
            return PreviewUpdate::Cleared;
        };

        let (width, height) = image.dimensions();
        let sized = match self.surface.take() {
            Some(mut surface) => surface.resize(width, height).map(|_| surface),
            None => Surface::new(width, height),
        };
        let rendered = sized.and_then(|mut surface| {
            self.compositor
                .render(&mut surface, image, &document.top, &document.bottom)
                .map(|_| surface)
        });

        match rendered {
            Ok(surface) => {
                self.surface = Some(surface);
                self.status = PreviewStatus::Ready;
                self.render_count += 1;
                tracing::debug!(
                    image = %image.id(),
                    width,
                    height,
                    renders = self.render_count,
                    "Preview refreshed"
                );
                PreviewUpdate::Rendered
            }
            Err(err) => {
                tracing::warn!(image = %image.id(), error = %err, "Preview unavailable");
                self.surface = None;
                self.status = PreviewStatus::Unavailable {
                    reason: err.to_string(),
                };
                PreviewUpdate::Failed(err)
            }
        }
    }

    pub fn status(&self) -> &PreviewStatus {
        &self.status
    }

    /// The rendered preview at the image's native size.
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Size the preview should be shown at.
    pub fn display_size(&self) -> Option<(u32, u32)> {
        self.surface
            .as_ref()
            .map(|surface| self.bounds.fit(surface.width(), surface.height()))
    }

    pub fn bounds(&self) -> DisplayBounds {
        self.bounds
    }

    /// Number of successful renders so far.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }
}
