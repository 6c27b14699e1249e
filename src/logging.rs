//! File logger for the binaries. The library only emits through the `log` macros.

use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_LOG_FILE: &str = "logs/pipeline.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to open log file '{0}'")]
    Open(PathBuf, #[source] std::io::Error),

    #[error("A logger is already installed")]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

/// Appends `timestamp - LEVEL - message` lines to `path` at info level and above.
/// `RUST_LOG` overrides the level.
pub fn init_file_logger(path: &Path) -> Result<(), LoggingError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LoggingError::DirCreation(parent.to_path_buf(), e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggingError::Open(path.to_path_buf(), e))?;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .try_init()?;
    Ok(())
}
