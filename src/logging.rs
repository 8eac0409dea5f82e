//! Log setup: `tracing` events go to stderr, or appended to the configured log file.
//!
//! `RUST_LOG` overrides the configured level, e.g. `RUST_LOG=pegel_lib=debug`.

use crate::config::LoggingConfig;
use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum LogInitError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot install log subscriber: {0}")]
    Install(String),
}

/// Filter from `RUST_LOG`, falling back to `level`.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Open `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> Result<File, LogInitError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogInitError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Install the global subscriber. Call once at startup.
pub fn init(config: &LoggingConfig) -> Result<(), LogInitError> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter(&config.level));

    let installed = match &config.file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };
    installed.map_err(|e| LogInitError::Install(e.to_string()))
}
