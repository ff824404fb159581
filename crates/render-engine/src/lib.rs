//! MemeForge Render Engine
//!
//! Composites captions onto a decoded image. One pure [`Compositor`]
//! serves two callers that differ only in the surface they hand it:
//!
//! ```text
//! ImageSource ── decode ──► ImageHandle ─┐
//!                                        │
//! TextLayer (top) ───────────────────────┼──► Compositor::render(surface, ..)
//! TextLayer (bottom) ────────────────────┘            │
//!                               ┌─────────────────────┴──────────────┐
//!                               ▼                                    ▼
//!                 PreviewController                         ExportController
//!           native-size surface, coalesced            fresh k× surface, PNG encode
//!           re-render on invalidate                             │
//!                                                               ▼
//!                                                   ExportSink (save/share)
//! ```
//!
//! Caption sizes scale with `surface height / image height`, so the preview
//! and a k× export show identical proportions.

pub mod compositor;
pub mod decode;
pub mod error;
pub mod export;
pub mod glyph;
pub mod preview;
pub mod surface;

pub use compositor::{CaptionLayout, Compositor, MAX_CAPTION_PIXELS};
pub use decode::{decode, decode_blocking, ImageSource};
pub use error::*;
pub use export::*;
pub use glyph::{BitmapFace, GlyphFace, OutlineFace, TextMask};
pub use preview::*;
pub use surface::Surface;
