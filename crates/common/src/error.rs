//! Error types shared across MemeForge crates.

use std::path::PathBuf;

/// Top-level error type for MemeForge host operations.
///
/// Library crates report their own narrow error enums; host commands fold
/// them into this one so every failure reaches the user the same way.
#[derive(Debug, thiserror::Error)]
pub enum MemeError {
    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Invalid caption: {message}")]
    Caption { message: String },

    #[error("Font error: {message}")]
    Font { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using MemeError.
pub type MemeResult<T> = Result<T, MemeError>;

impl MemeError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn caption(msg: impl Into<String>) -> Self {
        Self::Caption {
            message: msg.into(),
        }
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_messages() {
        assert_eq!(
            MemeError::export("no image loaded").to_string(),
            "Export error: no image loaded"
        );
        assert_eq!(
            MemeError::decode("bad header").to_string(),
            "Decode error: bad header"
        );
    }

    #[test]
    fn test_json_conversion() {
        fn fails() -> MemeResult<u32> {
            Ok(serde_json::from_str("not json")?)
        }
        assert!(matches!(fails(), Err(MemeError::Json(_))));
    }

    #[test]
    fn test_io_conversion() {
        fn fails() -> MemeResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(MemeError::Io(_))));
    }
}
