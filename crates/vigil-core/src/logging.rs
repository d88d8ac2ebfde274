//! Logging configuration using tracing

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/vigil/logs/`
/// Log level is controlled by the `VIGIL_LOG` environment variable.
///
/// # Examples
/// ```bash
/// VIGIL_LOG=debug vigil my-scenario
/// VIGIL_LOG=trace vigil my-scenario
/// ```
pub fn init() -> Result<()> {
    init_at(&get_log_directory())
}

/// Initialize logging with an explicit log directory.
pub fn init_at(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "vigil.log");

    // Default to info, allow override via VIGIL_LOG
    let env_filter =
        EnvFilter::try_from_env("VIGIL_LOG").unwrap_or_else(|_| EnvFilter::new("vigil=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("Vigil starting, log directory: {}", log_dir.display());

    Ok(())
}

/// Get the default log directory path
fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("vigil").join("logs")
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> PathBuf {
    get_log_directory().join("vigil.log")
}
