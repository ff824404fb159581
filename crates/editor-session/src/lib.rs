//! MemeForge Editor Session
//!
//! The host-facing side of the engine. A session owns the meme document
//! and is driven from a single event-processing thread:
//!
//! - control events call the per-field caption setters,
//! - image selections hand back a [`PendingDecode`] that the host runs
//!   on its async runtime and feeds back through
//!   [`EditorSession::complete_decode`],
//! - the host calls [`EditorSession::refresh_preview`] once per event-loop
//!   turn, which coalesces all changes since the previous turn,
//! - export runs on demand and never touches the preview.
//!
//! Every caught error is logged and forwarded to the host as a
//! [`Diagnostic`].

pub mod diagnostics;
pub mod selection;
pub mod session;

pub use diagnostics::*;
pub use selection::*;
pub use session::*;
