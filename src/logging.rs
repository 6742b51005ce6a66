//! Logging setup for the command line tool
//!
//! Two sinks share one `tracing` registry:
//! - the console, at INFO unless `RUST_LOG` says otherwise
//! - a DEBUG log file in the temp dir, the "full log" users are pointed to
//!   when something fails
//!
//! The log file rotates daily and only the most recent [`MAX_LOG_FILES`]
//! files are kept, so the temp dir never holds more than a few days of logs.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

/// File name prefix of the log files
pub const LOG_FILE_PREFIX: &str = "busca_retrabalho";

/// File name suffix (extension) of the log files
pub const LOG_FILE_SUFFIX: &str = "log";

/// Rotated log files kept in the log dir, today's included
pub const MAX_LOG_FILES: usize = 3;

/// Directive of the log file: everything from this crate, INFO from dependencies
const FILE_FILTER: &str = "info,busca_retrabalho=debug";

/// Keeps the file writer alive; logs are flushed when it is dropped
pub struct LogGuard {
    _guard: WorkerGuard,
    path: PathBuf,
}

impl LogGuard {
    /// Path of the log file written by this run
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Default directory of the log file (the OS temp dir)
pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Log file the daily appender writes to at `now`
///
/// Matches the appender naming: `{prefix}.{YYYY-MM-DD}.{suffix}`, dated in UTC.
pub fn log_file_path(log_dir: &Path, now: DateTime<Utc>) -> PathBuf {
    log_dir.join(format!(
        "{LOG_FILE_PREFIX}.{}.{LOG_FILE_SUFFIX}",
        now.format("%Y-%m-%d")
    ))
}

/// Daily rotating appender keeping [`MAX_LOG_FILES`] files
fn file_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)
        .map_err(|e| Error::Other(format!("Failed to open log file: {}", e)))
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init(log_dir: &Path) -> Result<LogGuard> {
    let appender = file_appender(log_dir)?;
    let path = log_file_path(log_dir, Utc::now());
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to initialize logging: {}", e)))?;

    Ok(LogGuard {
        _guard: guard,
        path,
    })
}
