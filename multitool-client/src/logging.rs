//! Tracing setup
//!
//! Logs always go to `multitool.log` in the data directory. `--debug` adds a
//! stderr layer. `MULTITOOL_LOG` overrides the file filter (e.g. `debug`).

use std::path::Path;

use multitool_common::constants::LOG_FILE_NAME;
use multitool_common::io::create_private_dir;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "MULTITOOL_LOG";

/// Default file log level
const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// until the program exits.
pub fn init(log_dir: &Path, debug: bool) -> Result<WorkerGuard, LoggingError> {
    create_private_dir(log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(file_filter);

    let console_layer = debug.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(EnvFilter::new("debug"))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(guard)
}

/// Errors that can occur while setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("failed to install subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
