//! Logging setup: stdout + a daily-rolling file appender under `LOG_DIR`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "mediaforge_server=info,tower_http=info,axum::rejection=trace";

/// Initialize global tracing. Returns the file-appender guard; drop it only at process exit
/// (dropping early silently stops file logging).
pub fn init_logging(log_dir: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(Path::new(log_dir))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "mediaforge-server.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let stdout_layer = fmt::layer().with_target(true);
    let file_layer = fmt::layer().with_target(true).with_ansi(false).with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install global tracing subscriber: {e}"))?;

    Ok(guard)
}
