//! Decoded raster images.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::RgbaImage;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one decoded image. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u64);

impl ImageId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img#{}", self.0)
    }
}

/// An already-decoded RGBA image.
///
/// Pixels are immutable and shared, so clones are cheap. Selecting a new
/// image replaces the handle wholesale.
#[derive(Clone)]
pub struct ImageHandle {
    id: ImageId,
    pixels: Arc<RgbaImage>,
}

impl ImageHandle {
    /// Wrap decoded pixels in a new handle with a fresh id.
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            id: ImageId(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed)),
            pixels: Arc::new(pixels),
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Whether both dimensions are positive.
    pub fn has_valid_dimensions(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageHandle {}
