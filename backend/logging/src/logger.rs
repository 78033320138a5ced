//! Structured Logger
//!
//! Wraps `tracing` with console output, optional NDJSON file rotation,
//! and environment-based level control.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the file writer flushing; drop it only at shutdown.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the global logger.
///
/// `RUST_LOG` takes precedence over `level`. When `log_dir` is set, a daily
/// rolling `signbridge.log.YYYY-MM-DD` NDJSON file is written next to the
/// console output. Console output goes to stderr so stdout stays clean for
/// `decode`.
pub fn init_logger(log_dir: Option<&Path>, level: &str, json_console: bool) -> LogGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = if json_console {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "signbridge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    LogGuard { _file: guard }
}
