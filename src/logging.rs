use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::domain::TableError;

/// The terminal belongs to the table, so logs go to a file.
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("datatable.log")
}

/// Installs the global subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing(log_file: &Path, verbose: bool) -> Result<(), TableError> {
    let file = File::create(log_file)?;

    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(verbose)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| TableError::LoggingFailed(e.to_string()))
}
