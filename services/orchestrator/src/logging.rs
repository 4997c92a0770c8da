use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `<YYYY-MM-DD_HH-MM-SS>.log` for the given start time.
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("{}.log", started.format(LOG_TIMESTAMP_FORMAT))
}

/// Installs the global subscriber: stderr plus one file per run under `log_dir`.
/// `RUST_LOG` overrides the default `info` filter. Keep the guard alive until
/// exit or buffered file lines are lost.
pub fn init_tracing(log_dir: &Path) -> Result<(WorkerGuard, PathBuf)> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log dir {}", log_dir.display()))?;

    let file_name = log_file_name(Local::now());
    let appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok((guard, log_dir.join(file_name)))
}
