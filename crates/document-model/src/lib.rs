//! MemeForge Document Model
//!
//! Defines the data contracts the compositor reads:
//! - **Color:** RGBA values in CSS hex notation
//! - **TextLayer:** one caption's content and style
//! - **ImageHandle:** an immutable, already-decoded raster image
//! - **MemeDocument:** the (image, top caption, bottom caption) triple
//!
//! Caption sizes are authored against the image's natural height and
//! positions are percentages of the image height, so a document renders
//! the same at any output resolution.

pub mod color;
pub mod document;
pub mod image_handle;
pub mod text_layer;

pub use color::*;
pub use document::*;
pub use image_handle::*;
pub use text_layer::*;
