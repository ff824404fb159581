//! The meme document: one image and two captions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::image_handle::ImageHandle;
use crate::text_layer::TextLayer;

/// Which caption a change targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerSlot {
    Top,
    Bottom,
}

impl LayerSlot {
    /// Both slots in render order.
    pub const ALL: [LayerSlot; 2] = [LayerSlot::Top, LayerSlot::Bottom];
}

impl fmt::Display for LayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerSlot::Top => f.write_str("top"),
            LayerSlot::Bottom => f.write_str("bottom"),
        }
    }
}

/// The (image, top caption, bottom caption) triple that fully determines a
/// composite.
#[derive(Debug, Clone, PartialEq)]
pub struct MemeDocument {
    /// The active image, if one has finished decoding.
    pub image: Option<ImageHandle>,

    pub top: TextLayer,

    pub bottom: TextLayer,
}

impl MemeDocument {
    /// An empty document with default captions.
    pub fn new() -> Self {
        Self {
            image: None,
            top: TextLayer::top(),
            bottom: TextLayer::bottom(),
        }
    }

    pub fn with_image(mut self, image: ImageHandle) -> Self {
        self.image = Some(image);
        self
    }

    pub fn layer(&self, slot: LayerSlot) -> &TextLayer {
        match slot {
            LayerSlot::Top => &self.top,
            LayerSlot::Bottom => &self.bottom,
        }
    }

    pub fn layer_mut(&mut self, slot: LayerSlot) -> &mut TextLayer {
        match slot {
            LayerSlot::Top => &mut self.top,
            LayerSlot::Bottom => &mut self.bottom,
        }
    }

    /// Replace the active image, returning the superseded one.
    pub fn replace_image(&mut self, image: Option<ImageHandle>) -> Option<ImageHandle> {
        std::mem::replace(&mut self.image, image)
    }
}

impl Default for MemeDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_new_document_has_default_captions() {
        let doc = MemeDocument::new();
        assert!(doc.image.is_none());
        assert_eq!(doc.layer(LayerSlot::Top).vertical_position, 15.0);
        assert_eq!(doc.layer(LayerSlot::Bottom).vertical_position, 85.0);
    }

    #[test]
    fn test_layer_mut_targets_slot() {
        let mut doc = MemeDocument::new();
        doc.layer_mut(LayerSlot::Bottom).set_content("NOBODY:");
        assert_eq!(doc.bottom.content, "NOBODY:");
        assert!(doc.top.is_empty());
    }

    #[test]
    fn test_replace_image_returns_previous() {
        let first = ImageHandle::from_rgba(RgbaImage::new(1, 1));
        let second = ImageHandle::from_rgba(RgbaImage::new(1, 1));
        let mut doc = MemeDocument::new().with_image(first.clone());

        let old = doc.replace_image(Some(second.clone()));
        assert_eq!(old, Some(first));
        assert_eq!(doc.image, Some(second));
    }

    #[test]
    fn test_slot_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LayerSlot::Top).unwrap(), "\"top\"");
        assert_eq!(LayerSlot::Bottom.to_string(), "bottom");
    }
}
