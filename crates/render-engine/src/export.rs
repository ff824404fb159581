//! High-resolution export.
//!
//! Every export renders a fresh surface from the document as it is at call
//! time. Nothing is cached and the preview surface is never touched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use memeforge_common::clock::{Clock, SystemClock};
use memeforge_common::config::ExportDefaults;
use memeforge_document_model::{ImageHandle, MemeDocument};

use crate::compositor::Compositor;
use crate::error::ExportError;
use crate::surface::Surface;

/// Export parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    /// Integer upscale factor applied to the image's native size.
    pub scale: u32,

    /// File name prefix.
    pub file_prefix: String,

    /// Largest allowed surface width or height.
    pub max_dimension: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from(&ExportDefaults::default())
    }
}

impl From<&ExportDefaults> for ExportSettings {
    fn from(defaults: &ExportDefaults) -> Self {
        Self {
            scale: defaults.scale,
            file_prefix: defaults.file_prefix.clone(),
            max_dimension: defaults.max_dimension,
        }
    }
}

/// An encoded export ready for the save/share boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// Deterministic file name, `{prefix}-{unix_millis}.png`.
    pub file_name: String,

    /// PNG-encoded pixels.
    pub bytes: Vec<u8>,

    pub width: u32,

    pub height: u32,
}

/// Renders and encodes exports on demand.
pub struct ExportController {
    compositor: Arc<Compositor>,
    settings: ExportSettings,
    clock: Arc<dyn Clock>,
}

impl ExportController {
    pub fn new(compositor: Arc<Compositor>, settings: ExportSettings) -> Self {
        Self::with_clock(compositor, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        compositor: Arc<Compositor>,
        settings: ExportSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            compositor,
            settings,
            clock,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Export at the configured scale.
    pub fn export(&self, document: &MemeDocument) -> Result<ExportedImage, ExportError> {
        self.export_scaled(document, self.settings.scale)
    }

    /// Export at an explicit scale factor `k`: the surface is
    /// `k × width` by `k × height`.
    pub fn export_scaled(
        &self,
        document: &MemeDocument,
        scale: u32,
    ) -> Result<ExportedImage, ExportError> {
        let image = document.image.as_ref().ok_or(ExportError::NoImage)?;
        let (width, height) = self.export_size(image, scale)?;

        tracing::info!(
            image = %image.id(),
            scale,
            width,
            height,
            "Starting export"
        );

        let mut surface = Surface::new(width, height)?;
        self.compositor
            .render(&mut surface, image, &document.top, &document.bottom)?;
        let bytes = encode_png(&surface)?;
        let file_name = format!(
            "{}-{}.png",
            self.settings.file_prefix,
            self.clock.now_millis()
        );

        tracing::info!(file = %file_name, bytes = bytes.len(), "Export encoded");
        Ok(ExportedImage {
            file_name,
            bytes,
            width,
            height,
        })
    }

    /// Output dimensions for `image` at `scale`.
    pub fn export_size(&self, image: &ImageHandle, scale: u32) -> Result<(u32, u32), ExportError> {
        if scale == 0 {
            return Err(ExportError::InvalidScale(scale));
        }
        let width = image.width() as u64 * scale as u64;
        let height = image.height() as u64 * scale as u64;
        let max = self.settings.max_dimension;
        if width > max as u64 || height > max as u64 {
            return Err(ExportError::SurfaceTooLarge { width, height, max });
        }
        Ok((width as u32, height as u32))
    }
}

impl std::fmt::Debug for ExportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportController")
            .field("compositor", &self.compositor)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Encode a surface as an 8-bit RGBA PNG.
pub fn encode_png(surface: &Surface) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    let (width, height) = surface.dimensions();
    PngEncoder::new(&mut bytes)
        .write_image(surface.pixels().as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(ExportError::Encode)?;
    Ok(bytes)
}

/// The platform save/share boundary.
pub trait ExportSink {
    /// Persist or hand off `image`, returning where it went.
    fn save(&mut self, image: &ExportedImage) -> Result<PathBuf, ExportError>;

    /// Sink name for logs.
    fn name(&self) -> &str;
}

/// Writes exports into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn save(&mut self, image: &ExportedImage) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(&image.file_name);
        std::fs::create_dir_all(&self.dir).map_err(|source| ExportError::Save {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, &image.bytes).map_err(|source| ExportError::Save {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Saved export");
        Ok(path)
    }

    fn name(&self) -> &str {
        "directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use memeforge_common::clock::FixedClock;
    use memeforge_document_model::TextLayer;

    fn controller(settings: ExportSettings) -> ExportController {
        ExportController::with_clock(
            Arc::new(Compositor::default()),
            settings,
            Arc::new(FixedClock::from_millis(1_700_000_000_000)),
        )
    }

    fn document(width: u32, height: u32) -> MemeDocument {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 100, 50, 255]));
        let mut doc = MemeDocument::new().with_image(ImageHandle::from_rgba(image));
        doc.top = TextLayer::top().with_content("TOP");
        doc
    }

    #[test]
    fn test_export_without_image_fails() {
        let err = controller(ExportSettings::default())
            .export(&MemeDocument::new())
            .unwrap_err();
        assert!(matches!(err, ExportError::NoImage));
    }

    #[test]
    fn test_export_doubles_dimensions_by_default() {
        let exported = controller(ExportSettings::default())
            .export(&document(120, 80))
            .unwrap();
        assert_eq!((exported.width, exported.height), (240, 160));
        assert_eq!(exported.file_name, "meme-1700000000000.png");

        let decoded = image::load_from_memory(&exported.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (240, 160));
    }

    #[test]
    fn test_export_reflects_current_document() {
        let export = controller(ExportSettings::default());
        let mut doc = document(60, 60);
        let first = export.export(&doc).unwrap();
        doc.top.set_content("CHANGED");
        let second = export.export(&doc).unwrap();
        assert_ne!(first.bytes, second.bytes);
    }

    #[test]
    fn test_scale_limits() {
        let export = controller(ExportSettings {
            max_dimension: 500,
            ..ExportSettings::default()
        });
        let doc = document(300, 100);
        assert!(matches!(
            export.export_scaled(&doc, 0),
            Err(ExportError::InvalidScale(0))
        ));
        assert!(matches!(
            export.export_scaled(&doc, 2),
            Err(ExportError::SurfaceTooLarge { width: 600, height: 200, max: 500 })
        ));
        assert!(export.export_scaled(&doc, 1).is_ok());
    }

    #[test]
    fn test_zero_sized_image_is_a_render_error() {
        let doc = MemeDocument::new().with_image(ImageHandle::from_rgba(RgbaImage::new(0, 4)));
        let err = controller(ExportSettings::default()).export(&doc).unwrap_err();
        assert!(matches!(err, ExportError::Render(_)));
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = std::env::temp_dir().join("memeforge_test_sink");
        let _ = std::fs::remove_dir_all(&dir);

        let exported = controller(ExportSettings::default())
            .export(&document(10, 10))
            .unwrap();
        let mut sink = DirectorySink::new(&dir);
        let path = sink.save(&exported).unwrap();

        assert_eq!(path, dir.join("meme-1700000000000.png"));
        assert_eq!(std::fs::read(&path).unwrap(), exported.bytes);

        std::fs::remove_dir_all(&dir).ok();
    }
}
