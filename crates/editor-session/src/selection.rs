//! Image selection tracking.
//!
//! Every selection is tagged with a token from a monotonically increasing
//! counter. A decode result is applied only if it carries the token of the
//! latest selection; anything older is stale and must be ignored, however
//! late it arrives.

use std::fmt;

use memeforge_document_model::ImageHandle;
use memeforge_render_engine::{decode, DecodeError, ImageSource};

/// Identity of one image selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionToken(u64);

impl SelectionToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SelectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sel#{}", self.0)
    }
}

/// Tracks the latest selection and whether its decode is still running.
#[derive(Debug, Default)]
pub struct ImageSelection {
    latest: u64,
    loading: bool,
}

impl ImageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new selection, superseding any previous one.
    pub fn begin(&mut self) -> SelectionToken {
        self.latest += 1;
        self.loading = true;
        SelectionToken(self.latest)
    }

    /// The most recent selection, if any was made.
    pub fn current(&self) -> Option<SelectionToken> {
        (self.latest > 0).then_some(SelectionToken(self.latest))
    }

    pub fn is_current(&self, token: SelectionToken) -> bool {
        token.0 == self.latest
    }

    /// Whether the latest selection is still decoding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Record that `token`'s decode finished. Returns whether the result
    /// should be applied.
    pub fn settle(&mut self, token: SelectionToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.loading = false;
        true
    }
}

/// A decode the host must run and report back.
#[derive(Debug)]
pub struct PendingDecode {
    pub token: SelectionToken,
    pub source: ImageSource,
}

impl PendingDecode {
    /// Decode the source, keeping the selection token attached.
    pub async fn run(self) -> DecodeCompletion {
        let result = decode(self.source).await;
        DecodeCompletion {
            token: self.token,
            result,
        }
    }
}

/// The outcome of a [`PendingDecode`].
#[derive(Debug)]
pub struct DecodeCompletion {
    pub token: SelectionToken,
    pub result: Result<ImageHandle, DecodeError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increase() {
        let mut selection = ImageSelection::new();
        assert_eq!(selection.current(), None);
        let a = selection.begin();
        let b = selection.begin();
        assert!(b > a);
        assert_eq!(selection.current(), Some(b));
    }

    #[test]
    fn test_only_latest_settles() {
        let mut selection = ImageSelection::new();
        let stale = selection.begin();
        let fresh = selection.begin();
        assert!(selection.is_loading());

        assert!(!selection.settle(stale));
        assert!(selection.is_loading());

        assert!(selection.settle(fresh));
        assert!(!selection.is_loading());
    }
}
