//! Logging setup for GridBridge tools.
//!
//! Compact output always goes to stderr. An optional log file receives the
//! same events in the pretty format; it is cleared when logging starts.
//! RUST_LOG overrides the default level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the log file writer alive.
///
/// Dropping this guard flushes and closes the log file.
pub struct LoggingGuard {
    file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Whether events are also written to a file.
    pub fn has_file(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Installs the global subscriber.
///
/// `verbose` lowers the default level to `debug`; otherwise it is `info`
/// with a log file and `warn` without one.
///
/// # Errors
///
/// Returns an error if the log file cannot be prepared or a global
/// subscriber is already installed.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> io::Result<LoggingGuard> {
    let default_level = match (verbose, log_file) {
        (true, _) => "debug",
        (false, Some(_)) => "info",
        (false, None) => "warn",
    };

    let (file_layer, file_guard) = match log_file {
        Some(path) => {
            let (dir, name) = prepare_log_file(path)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .pretty();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard { file_guard })
}

/// Creates the parent directory and empties the file.
///
/// Returns the directory and file name the appender writes to.
fn prepare_log_file(path: &Path) -> io::Result<(PathBuf, PathBuf)> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log file path has no file name: {}", path.display()),
        )
    })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    fs::create_dir_all(&dir)?;
    fs::write(path, "")?;
    Ok((dir, PathBuf::from(name)))
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
