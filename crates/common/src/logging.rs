//! Logging and tracing initialization.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// Logs go to stderr unless `config.file` names a writable file, in which
/// case they are appended there. Calling this twice is harmless; the second
/// subscriber is ignored.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let writer = make_writer(config);

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .with_ansi(config.file.is_none())
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Why a log file could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum LogFileError {
    #[error("cannot create log directory {}: {source}", dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Open `path` for appending, creating its parent directory first.
pub fn open_log_file(path: &Path) -> Result<File, LogFileError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| LogFileError::CreateDir {
            dir: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogFileError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn make_writer(config: &LoggingConfig) -> BoxMakeWriter {
    let Some(path) = &config.file else {
        return BoxMakeWriter::new(std::io::stderr);
    };

    match open_log_file(path) {
        Ok(file) => BoxMakeWriter::new(Mutex::new(file)),
        Err(e) => {
            // No subscriber exists yet, so this is the only place to say it.
            eprintln!("memeforge: {e}; logging to stderr");
            BoxMakeWriter::new(std::io::stderr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parent() {
        let dir = std::env::temp_dir().join("memeforge_test_logs");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("memeforge.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_open_log_file_reports_directory_failure() {
        let dir = std::env::temp_dir().join("memeforge_test_logs_blocked");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let err = open_log_file(&blocker.join("memeforge.log")).unwrap_err();
        assert!(matches!(&err, LogFileError::CreateDir { dir, .. } if *dir == blocker));
        assert!(err.to_string().contains("cannot create log directory"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
