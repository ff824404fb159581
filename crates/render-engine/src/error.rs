//! Error types for decoding, rendering, and export.

use std::path::PathBuf;

use memeforge_common::error::MemeError;

/// The compositor could not produce pixels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("image has invalid dimensions {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    #[error("surface cannot be sized to {width}x{height}")]
    EmptySurface { width: u32, height: u32 },

    #[error("caption needs a {pixels}px mask, more than the {max}px limit")]
    CaptionTooLarge { pixels: u64, max: u64 },
}

/// An image source could not be turned into an [`ImageHandle`].
///
/// [`ImageHandle`]: memeforge_document_model::ImageHandle
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported or corrupt image data: {0}")]
    Image(#[from] image::ImageError),

    #[error("decoded image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("decode task did not complete: {0}")]
    Task(String),
}

/// An export could not be produced or saved.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no image is loaded")]
    NoImage,

    #[error("export scale must be at least 1, got {0}")]
    InvalidScale(u32),

    #[error("export surface {width}x{height} exceeds the {max}px limit")]
    SurfaceTooLarge { width: u64, height: u64, max: u32 },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("PNG encoding failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A font file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid font data in {name}")]
    Invalid {
        name: String,
        #[source]
        source: ab_glyph::InvalidFont,
    },
}

impl From<RenderError> for MemeError {
    fn from(err: RenderError) -> Self {
        MemeError::render(err.to_string())
    }
}

impl From<DecodeError> for MemeError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Io { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                MemeError::FileNotFound { path }
            }
            other => MemeError::decode(other.to_string()),
        }
    }
}

impl From<ExportError> for MemeError {
    fn from(err: ExportError) -> Self {
        MemeError::export(err.to_string())
    }
}

impl From<FontError> for MemeError {
    fn from(err: FontError) -> Self {
        MemeError::font(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_file_not_found() {
        let err = DecodeError::Io {
            path: PathBuf::from("/nope.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(matches!(
            MemeError::from(err),
            MemeError::FileNotFound { path } if path == PathBuf::from("/nope.png")
        ));
    }

    #[test]
    fn test_engine_errors_fold_into_meme_error() {
        let export = MemeError::from(ExportError::NoImage);
        assert_eq!(export.to_string(), "Export error: no image is loaded");

        let render = MemeError::from(RenderError::CaptionTooLarge { pixels: 10, max: 5 });
        assert!(matches!(render, MemeError::Render { .. }));

        let font = MemeError::from(FontError::Io {
            path: PathBuf::from("/fonts/impact.ttf"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        });
        assert!(matches!(font, MemeError::Font { .. }));
    }

    #[test]
    fn test_render_error_wraps_into_export_error() {
        let err: ExportError = RenderError::InvalidImage {
            width: 0,
            height: 10,
        }
        .into();
        assert_eq!(err.to_string(), "image has invalid dimensions 0x10");
    }
}
