//! MemeForge Common Utilities
//!
//! Shared infrastructure for all MemeForge crates:
//! - Error types and result aliases
//! - Wall-clock access for deterministic export naming
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
