//! Tracing subscriber setup shared by both binaries.

use crate::config::LoggingConfig;
use crate::error::{AvatarError, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// File name prefix for the rolling log; the date is appended per day.
pub const LOG_FILE_PREFIX: &str = "visage.log";

/// `RUST_LOG` if set, else `level` for this crate with noisy dependencies
/// turned down.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "visage={level},hyper=warn,reqwest=warn,tungstenite=warn,tokio_tungstenite=warn"
        ))
    })
}

/// Non-blocking writer over a daily rolling file in `dir`.
///
/// Buffered lines are flushed when the returned guard is dropped.
pub fn file_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber: stderr always, plus a rolling file when
/// `log_dir` is configured. Keep the returned guard alive for the life of
/// the process.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| AvatarError::Config(format!("cannot install tracing subscriber: {e}")))?;
    Ok(guard)
}
