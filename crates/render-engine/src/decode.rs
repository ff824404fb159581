//! Image decoding.
//!
//! Decoding is the only suspending step in the pipeline. The CPU-bound work
//! runs on tokio's blocking pool; the returned future resolves once pixels
//! are ready.

use std::path::PathBuf;

use memeforge_document_model::ImageHandle;

use crate::error::DecodeError;

/// Where an image comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded image bytes (PNG, JPEG, GIF, WebP, BMP).
    Bytes(Vec<u8>),
    /// A file on disk.
    File(PathBuf),
}

impl ImageSource {
    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Bytes(bytes) => format!("{} bytes", bytes.len()),
            ImageSource::File(path) => path.display().to_string(),
        }
    }
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSource::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            ImageSource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::File(path)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

/// Decode `source` off the async executor.
pub async fn decode(source: ImageSource) -> Result<ImageHandle, DecodeError> {
    tokio::task::spawn_blocking(move || decode_blocking(source))
        .await
        .map_err(|e| DecodeError::Task(e.to_string()))?
}

/// Decode `source` on the current thread.
pub fn decode_blocking(source: ImageSource) -> Result<ImageHandle, DecodeError> {
    let description = source.describe();
    let bytes = match source {
        ImageSource::Bytes(bytes) => bytes,
        ImageSource::File(path) => {
            std::fs::read(&path).map_err(|source| DecodeError::Io { path, source })?
        }
    };

    let pixels = image::load_from_memory(&bytes)?.into_rgba8();
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }

    let handle = ImageHandle::from_rgba(pixels);
    tracing::debug!(
        source = %description,
        image = %handle.id(),
        width,
        height,
        "Decoded image"
    );
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let surface = Surface::new(width, height).unwrap();
        crate::export::encode_png(&surface).unwrap()
    }

    #[test]
    fn test_decode_png_bytes() {
        let handle = decode_blocking(ImageSource::Bytes(png_bytes(7, 3))).unwrap();
        assert_eq!(handle.dimensions(), (7, 3));
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let err = decode_blocking(ImageSource::Bytes(b"not an image".to_vec())).unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[test]
    fn test_missing_file_fails() {
        let err =
            decode_blocking(ImageSource::File(PathBuf::from("/no/such/meme.png"))).unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }

    #[tokio::test]
    async fn test_async_decode_from_file() {
        let dir = std::env::temp_dir().join("memeforge_test_decode");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("input.png");
        std::fs::write(&path, png_bytes(16, 9)).unwrap();

        let handle = decode(ImageSource::File(path)).await.unwrap();
        assert_eq!(handle.dimensions(), (16, 9));

        std::fs::remove_dir_all(&dir).ok();
    }
}
