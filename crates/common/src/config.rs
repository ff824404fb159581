//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Live preview settings.
    #[serde(default)]
    pub preview: PreviewDefaults,

    /// High-resolution export settings.
    #[serde(default)]
    pub export: ExportDefaults,

    /// Caption font settings.
    #[serde(default)]
    pub font: FontConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Preview display bounds.
///
/// The preview surface always keeps the image's native pixel size; these
/// bounds only limit the size it is shown at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewDefaults {
    /// Maximum on-screen width in pixels (`None` = unbounded).
    #[serde(default)]
    pub max_display_width: Option<u32>,

    /// Maximum on-screen height in pixels.
    pub max_display_height: u32,
}

/// Export parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDefaults {
    /// Integer upscale factor applied to the image's native size.
    pub scale: u32,

    /// File name prefix; names are `{prefix}-{unix_millis}.png`.
    pub file_prefix: String,

    /// Largest allowed width or height of an export surface.
    pub max_dimension: u32,

    /// Directory exports are saved into.
    pub output_dir: PathBuf,
}

/// Caption font selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontConfig {
    /// TrueType/OpenType font file. The built-in bitmap face is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "memeforge=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preview: PreviewDefaults::default(),
            export: ExportDefaults::default(),
            font: FontConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PreviewDefaults {
    fn default() -> Self {
        Self {
            max_display_width: None,
            max_display_height: 400,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            scale: 2,
            file_prefix: "meme".to_string(),
            max_dimension: 16_384,
            output_dir: default_output_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("memeforge").join("config.json")
}

/// Default export directory.
fn default_output_dir() -> PathBuf {
    let base = std::env::var("XDG_PICTURES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join("Pictures")
        });
    base.join("memeforge")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_ui() {
        let config = AppConfig::default();
        assert_eq!(config.export.scale, 2);
        assert_eq!(config.export.file_prefix, "meme");
        assert_eq!(config.preview.max_display_height, 400);
        assert!(config.font.path.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"export":{"scale":3,"file_prefix":"cap","max_dimension":4096,"output_dir":"/tmp/out"}}"#)
                .unwrap();
        assert_eq!(parsed.export.scale, 3);
        assert_eq!(parsed.preview, PreviewDefaults::default());
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join("memeforge_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.export.scale = 4;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("memeforge_test_bad_config");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(AppConfig::load_from(&path), AppConfig::default());

        std::fs::remove_dir_all(&dir).ok();
    }
}
