//! File logging. The TUI owns stdout, so events go to a daily rolling file
//! under the data directory.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogConfig;

const LOG_FILE_BASENAME: &str = "kboard.log";

/// Env var that overrides the configured filter
pub const LOG_ENV: &str = "KBOARD_LOG";

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered lines are lost.
pub fn init_logging(config: &LogConfig, log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_BASENAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = build_filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()
    };
    result.context("Failed to install log subscriber")?;

    Ok(guard)
}

/// Filter from `KBOARD_LOG` if set, else the configured level
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
