//! Logging configuration using tracing
//!
//! Provides structured logging to stderr and to a per-run log file, with
//! support for the RUST_LOG environment variable.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when RUST_LOG is not set
pub const DEFAULT_FILTER: &str = "datasync=info,rsync=info";

/// Keeps the file writer alive; drop it at the end of the run to flush
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    path: Option<PathBuf>,
}

impl LogGuard {
    /// Path of this run's log file, if file logging is active
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Name of the log file for a run started now
pub fn log_file_name() -> String {
    format!("datasync_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Initialize the tracing subscriber
///
/// Sets up structured logging with:
/// - Filtering via RUST_LOG environment variable (defaults to [`DEFAULT_FILTER`])
/// - Formatted output to stderr
/// - A fresh log file in `log_dir` for this run, if given and writable
///
/// # Example RUST_LOG values
/// - `RUST_LOG=debug` - Show debug and above
/// - `RUST_LOG=datasync=trace` - Trace level for datasync crate
/// - `RUST_LOG=datasync=debug,rsync=info` - Different levels per crate
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init(log_dir: Option<&Path>) -> crate::Result<LogGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let mut guard = LogGuard {
        _file: None,
        path: None,
    };

    let file_layer = match log_dir {
        Some(dir) => match fs::create_dir_all(dir) {
            Ok(()) => {
                let name = log_file_name();
                let appender = tracing_appender::rolling::never(dir, &name);
                let (writer, worker) = tracing_appender::non_blocking(appender);
                guard._file = Some(worker);
                guard.path = Some(dir.join(name));
                Some(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_filter(env_filter.clone()),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: failed to create log directory {}: {}",
                    dir.display(),
                    e
                );
                None
            }
        },
        None => None,
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| crate::DataSyncError::Other(format!("Failed to initialize tracing: {}", e)))?;

    Ok(guard)
}

/// Initialize console-only logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init(None);
}
