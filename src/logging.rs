//! Logging initialization for the command-line tool.
//!
//! Library code only emits `tracing` events; the binary decides where they go.
//! By default logs are appended to `{data_dir}/dep-lookup.log` so they never
//! interleave with the printed tree.

use std::ffi::OsStr;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Where and how log lines are written
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Raise the crate's level from INFO to DEBUG
    pub verbose: bool,
    /// Write to stderr instead of the log file
    pub stderr: bool,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbose`. The returned guard flushes the
/// file writer on drop and must be held until the program exits.
pub fn init(options: LogOptions, log_path: &Path) -> anyhow::Result<Option<WorkerGuard>> {
    let level = if options.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,dep_lookup={level}")));

    let (writer, guard) = if options.stderr {
        (BoxMakeWriter::new(std::io::stderr), None)
    } else {
        let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = log_path
            .file_name()
            .unwrap_or_else(|| OsStr::new("dep-lookup.log"));
        std::fs::create_dir_all(dir)?;

        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        (BoxMakeWriter::new(non_blocking), Some(guard))
    };

    let subscriber = tracing_subscriber::registry().with(filter);
    if options.json {
        subscriber
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_ansi(options.stderr)
                    .with_target(false)
                    .with_writer(writer),
            )
            .try_init()?;
    }

    Ok(guard)
}
