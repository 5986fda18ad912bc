//! Structured logging setup using the `tracing` ecosystem.
//!
//! Store lifecycle failures (degraded startup, blocked deletes, per-record
//! seed failures) are contained and only ever reported through these logs,
//! so the file layer keeps target and line information.

use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling;

use crate::config::LoggingConfig;
use crate::error::GaResult;

/// File name prefix for the daily-rotated log.
const LOG_FILE_PREFIX: &str = "gachat.log";

/// Build the level filter, falling back to `info` for unparsable input.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// Console output goes to stderr in compact form; file output is rotated
/// daily under `log_dir` and optionally written as JSON.
pub fn init_logging(config: &LoggingConfig, log_dir: &Path) -> GaResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let (writer, guard) =
        tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();
    let registry = tracing_subscriber::registry()
        .with(level_filter(&config.level))
        .with(console_layer);

    if config.json_output {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::info!(
        "logging initialized at level={}, dir={}",
        config.level,
        log_dir.display()
    );

    Ok(LogGuard { _guard: guard })
}

/// Guard that keeps the non-blocking log writer alive.
/// Drop this to flush and close the log file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize a minimal console-only logger for tests or one-shot CLI commands.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(level_filter(level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init();
}
