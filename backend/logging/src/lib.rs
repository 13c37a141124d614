//! Structured logging setup.
//!
//! Wraps `tracing` to provide a console stream plus a daily-rolling
//! NDJSON file, with environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global logger: stdout console layer plus a rolling
/// file appender writing NDJSON to `<log_dir>/snaptask.log.YYYY-MM-DD`.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "snaptask.log");

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
